use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum Category {
    FoodAndDining,
    Transportation,
    Shopping,
    Entertainment,
    BillsAndUtilities,
    Healthcare,
    Education,
    Travel,
    Others,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FoodAndDining => "Food & Dining",
            Self::Transportation => "Transportation",
            Self::Shopping => "Shopping",
            Self::Entertainment => "Entertainment",
            Self::BillsAndUtilities => "Bills & Utilities",
            Self::Healthcare => "Healthcare",
            Self::Education => "Education",
            Self::Travel => "Travel",
            Self::Others => "Others",
        }
    }

    /// Strict, case-insensitive lookup. Accepts the display name or a few
    /// short forms ("food", "bills", "health").
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "food & dining" | "food" | "dining" => Some(Self::FoodAndDining),
            "transportation" | "transport" => Some(Self::Transportation),
            "shopping" => Some(Self::Shopping),
            "entertainment" => Some(Self::Entertainment),
            "bills & utilities" | "bills" | "utilities" => Some(Self::BillsAndUtilities),
            "healthcare" | "health" => Some(Self::Healthcare),
            "education" => Some(Self::Education),
            "travel" => Some(Self::Travel),
            "others" | "other" => Some(Self::Others),
            _ => None,
        }
    }

    /// Lenient parse used for rows coming off the wire: anything unknown
    /// lands in `Others`.
    pub fn parse(s: &str) -> Self {
        Self::from_name(s).unwrap_or(Self::Others)
    }

    pub fn all() -> &'static [Category] {
        &[
            Self::FoodAndDining,
            Self::Transportation,
            Self::Shopping,
            Self::Entertainment,
            Self::BillsAndUtilities,
            Self::Healthcare,
            Self::Education,
            Self::Travel,
            Self::Others,
        ]
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Category> for &'static str {
    fn from(c: Category) -> Self {
        c.as_str()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment methods offered by the expense form. The stored value is a free
/// string, so rows with other methods are kept as-is.
pub const PAYMENT_METHODS: &[&str] = &[
    "UPI",
    "Credit Card",
    "Debit Card",
    "Cash",
    "Bank Transfer",
    "Digital Wallet",
];
