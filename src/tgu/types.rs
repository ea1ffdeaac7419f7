//! Slot addressing types.

/// Maximum number of priority banks evaluated per step.
pub const MAX_PRIORITY: usize = 4;

/// Kind of configurable register bank inside a step.
///
/// The set is closed: every TGU revision exposes a subset of these banks,
/// never anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationKind {
    Priority0,
    Priority1,
    Priority2,
    Priority3,
    ConditionDecode,
    ConditionSelect,
    Timer,
    Counter,
}

impl OperationKind {
    /// All kinds, priority banks first.
    pub const ALL: [OperationKind; 8] = [
        OperationKind::Priority0,
        OperationKind::Priority1,
        OperationKind::Priority2,
        OperationKind::Priority3,
        OperationKind::ConditionDecode,
        OperationKind::ConditionSelect,
        OperationKind::Timer,
        OperationKind::Counter,
    ];

    /// The four priority banks in ordinal order.
    pub const PRIORITIES: [OperationKind; MAX_PRIORITY] = [
        OperationKind::Priority0,
        OperationKind::Priority1,
        OperationKind::Priority2,
        OperationKind::Priority3,
    ];

    /// Returns the priority bank for `level`, if `level < 4`.
    pub fn priority(level: usize) -> Option<Self> {
        Self::PRIORITIES.get(level).copied()
    }

    /// Returns the priority ordinal (0..=3) for priority banks.
    #[inline]
    pub fn priority_level(self) -> Option<usize> {
        match self {
            OperationKind::Priority0 => Some(0),
            OperationKind::Priority1 => Some(1),
            OperationKind::Priority2 => Some(2),
            OperationKind::Priority3 => Some(3),
            _ => None,
        }
    }

    #[inline]
    pub fn is_priority(self) -> bool {
        self.priority_level().is_some()
    }

    /// Control group suffix used by the attribute surface.
    pub fn name(self) -> &'static str {
        match self {
            OperationKind::Priority0 => "priority0",
            OperationKind::Priority1 => "priority1",
            OperationKind::Priority2 => "priority2",
            OperationKind::Priority3 => "priority3",
            OperationKind::ConditionDecode => "condition_decode",
            OperationKind::ConditionSelect => "condition_select",
            OperationKind::Timer => "timer",
            OperationKind::Counter => "counter",
        }
    }
}

/// One configurable register: `(step, kind, reg)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    pub step: usize,
    pub kind: OperationKind,
    pub reg: usize,
}

impl Slot {
    #[inline]
    pub const fn new(step: usize, kind: OperationKind, reg: usize) -> Self {
        Self { step, kind, reg }
    }
}
