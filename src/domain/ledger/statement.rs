use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Money;

/// 取引種別
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Credit,
    Debit,
}

/// 取引明細
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    amount: Money,
    created_at: DateTime<Utc>,
    #[serde(rename = "type")]
    kind: EntryType,
}

impl StatementEntry {
    pub fn credit(amount: Money, description: Option<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            description,
            amount,
            created_at,
            kind: EntryType::Credit,
        }
    }

    pub fn debit(amount: Money, created_at: DateTime<Utc>) -> Self {
        Self {
            description: None,
            amount,
            created_at,
            kind: EntryType::Debit,
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn kind(&self) -> EntryType {
        self.kind
    }

    /// 指定日 (UTC) に作成された明細か
    pub fn is_on(&self, date: NaiveDate) -> bool {
        self.created_at.date_naive() == date
    }
}

/// 明細を先頭から畳み込んで残高を求める。桁あふれした場合は `None`
pub fn balance<'a, I>(statement: I) -> Option<Money>
where
    I: IntoIterator<Item = &'a StatementEntry>,
{
    statement
        .into_iter()
        .try_fold(Money::ZERO, |acc, entry| match entry.kind {
            EntryType::Credit => acc.checked_add(entry.amount),
            EntryType::Debit => acc.checked_sub(entry.amount),
        })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_balance_fold() {
        let at = Utc::now();
        let statement = vec![
            StatementEntry::credit(dec!(100).into(), None, at),
            StatementEntry::debit(dec!(30.25).into(), at),
            StatementEntry::credit(dec!(-10).into(), Some("refund".to_owned()), at),
            StatementEntry::debit(dec!(0).into(), at),
        ];
        assert_eq!(balance(&statement), Some(Money::from(dec!(59.75))));
        assert_eq!(balance(&Vec::<StatementEntry>::new()), Some(Money::ZERO));
    }

    #[test]
    fn test_balance_overflow() {
        let at = Utc::now();
        let max = Money::from(rust_decimal::Decimal::MAX);
        let statement = vec![
            StatementEntry::credit(max, None, at),
            StatementEntry::credit(max, None, at),
        ];
        assert_eq!(balance(&statement), None);
        assert_eq!(balance(&statement[..1]), Some(max));
    }

    #[test]
    fn test_is_on() {
        let entry = StatementEntry::debit(
            dec!(1).into(),
            Utc.with_ymd_and_hms(2023, 4, 1, 23, 59, 59).unwrap(),
        );
        assert!(entry.is_on(NaiveDate::from_ymd_opt(2023, 4, 1).unwrap()));
        assert!(!entry.is_on(NaiveDate::from_ymd_opt(2023, 4, 2).unwrap()));
    }

    #[test]
    fn test_entry_json() {
        let at = Utc.with_ymd_and_hms(2023, 4, 1, 12, 0, 0).unwrap();
        let credit = StatementEntry::credit(dec!(100).into(), Some("salary".to_owned()), at);
        assert_eq!(
            serde_json::to_value(&credit).unwrap(),
            json!({
                "description": "salary",
                "amount": 100.0,
                "created_at": "2023-04-01T12:00:00Z",
                "type": "credit",
            })
        );
        let debit = StatementEntry::debit(dec!(40).into(), at);
        assert_eq!(
            serde_json::to_value(&debit).unwrap(),
            json!({
                "amount": 40.0,
                "created_at": "2023-04-01T12:00:00Z",
                "type": "debit",
            })
        );
    }
}
