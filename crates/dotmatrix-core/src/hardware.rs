#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
/// DMG hardware revision.
///
/// Selects the register file and divider phase the boot ROM leaves behind,
/// since emulation starts from the post-boot state.
pub enum DmgRevision {
    Rev0,
    RevA,
    RevB,
    #[default]
    RevC,
}

impl DmgRevision {
    /// Internal divider value at 0x0100, measured by mooneye's boot_div tests.
    #[inline]
    pub const fn boot_div_phase(self) -> u16 {
        match self {
            DmgRevision::Rev0 => 0x1830,
            DmgRevision::RevA | DmgRevision::RevB | DmgRevision::RevC => 0xABCC,
        }
    }
}
