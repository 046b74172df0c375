use num_enum::TryFromPrimitive;

/// priority_flag (5.2.14): Level 0 (lowest) to Level 3 (highest). Meaning of each
/// level is network specific; values 4-255 are reserved.
#[derive(TryFromPrimitive, Default)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PriorityFlag {
    #[default]
    Level0 = 0,
    Level1 = 1,
    Level2 = 2,
    Level3 = 3,
}
