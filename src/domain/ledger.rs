mod customer;
mod statement;

use derive_more::{Deref, Display, From};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Id;

pub use self::customer::*;
pub use self::statement::*;

/// 金額
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    From,
    Deref,
)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// 桁あふれする場合は `None`
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// 桁あふれする場合は `None`
    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }
}

/// イベントストア用の金額表現。浮動小数点を経由せず10進文字列で保存する
pub(crate) mod exact {
    use serde::{Deserializer, Serializer};

    use super::Money;

    pub fn serialize<S>(value: &Money, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        rust_decimal::serde::str::serialize(&value.0, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Money, D::Error>
    where
        D: Deserializer<'de>,
    {
        rust_decimal::serde::str::deserialize(deserializer).map(Money)
    }
}

/// 顧客の国民識別番号 (CPF)
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Deref)]
pub struct Cpf(String);

impl From<&str> for Cpf {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// 顧客ID
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Display, From, Deref, Default,
)]
pub struct CustomerId(Uuid);

impl CustomerId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Id for CustomerId {
    type Inner = Uuid;
}
