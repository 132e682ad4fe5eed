use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

pub type AccountId = u64;
pub type LoanId = u64;
pub type PaymentId = u64;
pub type AccountPaymentId = u64;

/// The three balances an instalment can owe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    LateFee,
    Interest,
    Principal,
}

/// Order in which an incoming amount is consumed. Each component is a full
/// pass over every payment before the next component starts.
pub const ALLOCATION_ORDER: [Component; 3] =
    [Component::LateFee, Component::Interest, Component::Principal];

impl Component {
    pub fn label(&self) -> &'static str {
        match self {
            Component::LateFee => "late_fee",
            Component::Interest => "interest",
            Component::Principal => "principal",
        }
    }
}

/// One amount per component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentAmounts {
    #[serde(default)]
    pub late_fee: Money,
    #[serde(default)]
    pub interest: Money,
    #[serde(default)]
    pub principal: Money,
}

impl ComponentAmounts {
    pub fn new(late_fee: Money, interest: Money, principal: Money) -> Self {
        ComponentAmounts {
            late_fee,
            interest,
            principal,
        }
    }

    pub fn get(&self, component: Component) -> Money {
        match component {
            Component::LateFee => self.late_fee,
            Component::Interest => self.interest,
            Component::Principal => self.principal,
        }
    }

    pub fn get_mut(&mut self, component: Component) -> &mut Money {
        match component {
            Component::LateFee => &mut self.late_fee,
            Component::Interest => &mut self.interest,
            Component::Principal => &mut self.principal,
        }
    }

    pub fn total(&self) -> Money {
        self.late_fee + self.interest + self.principal
    }

    pub fn is_zero(&self) -> bool {
        self.total().is_zero()
    }

    pub fn has_negative(&self) -> bool {
        ALLOCATION_ORDER
            .iter()
            .any(|c| self.get(*c) < Decimal::ZERO)
    }
}

impl std::ops::AddAssign for ComponentAmounts {
    fn add_assign(&mut self, rhs: Self) {
        self.late_fee += rhs.late_fee;
        self.interest += rhs.interest;
        self.principal += rhs.principal;
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
