use serde::{Deserialize, Deserializer};

/// Whole-point quantity. Signed so that zero and negative requests can be
/// represented and rejected at the service boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Points(pub i64);

impl Points {
    pub const ZERO: Points = Points(0);

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, rhs: Points) -> Option<Points> {
        self.0.checked_add(rhs.0).map(Points)
    }

    pub fn checked_sub(self, rhs: Points) -> Option<Points> {
        self.0.checked_sub(rhs.0).map(Points)
    }

    pub fn from_integer_str(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        s.parse::<i64>().ok().map(Points)
    }
}

impl From<i64> for Points {
    fn from(value: i64) -> Self {
        Points(value)
    }
}

impl core::fmt::Display for Points {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Points {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Points::from_integer_str(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("Invalid point amount: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::Points;

    #[test]
    fn parses_signed_integers() {
        assert_eq!(Points::from_integer_str(" 50 "), Some(Points(50)));
        assert_eq!(Points::from_integer_str("-50"), Some(Points(-50)));
        assert_eq!(Points::from_integer_str("0"), Some(Points::ZERO));
    }

    #[test]
    fn rejects_fractions_and_garbage() {
        assert_eq!(Points::from_integer_str("1.5"), None);
        assert_eq!(Points::from_integer_str(""), None);
        assert_eq!(Points::from_integer_str("ten"), None);
        assert_eq!(Points::from_integer_str("99999999999999999999"), None);
    }

    #[test]
    fn checked_arithmetic_reports_overflow() {
        assert_eq!(Points(i64::MAX).checked_add(Points(1)), None);
        assert_eq!(Points(30).checked_sub(Points(50)), Some(Points(-20)));
    }
}
