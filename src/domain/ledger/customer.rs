use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

use crate::domain::{DataAccessError, Entity, Event, EventQueue, EventQueueIntoIter};

use super::{balance, Cpf, CustomerId, Money, StatementEntry};

/// 顧客リポジトリ
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// 顧客をCPFで検索する
    async fn find_by_cpf(&self, cpf: &Cpf) -> Result<Option<Customer>, DataAccessError>;
    /// 全顧客を登録順で取得する
    async fn find_all(&self) -> Result<Vec<Customer>, DataAccessError>;
    /// 顧客の未保存イベントを保存する
    async fn save(&mut self, entity: &mut Customer) -> Result<bool, DataAccessError>;
    /// 顧客を削除する
    async fn delete(&mut self, entity: &mut Customer) -> Result<bool, DataAccessError>;
}

/// 顧客イベント
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerEvent {
    /// 口座が開設された
    AccountOpened {
        id: CustomerId,
        cpf: Cpf,
        name: String,
    },
    /// 入金された
    Deposited {
        id: CustomerId,
        #[serde(with = "crate::domain::ledger::exact")]
        amount: Money,
        description: Option<String>,
        created_at: DateTime<Utc>,
    },
    /// 出金された
    Withdrawn {
        id: CustomerId,
        #[serde(with = "crate::domain::ledger::exact")]
        amount: Money,
        created_at: DateTime<Utc>,
    },
    /// 名義が変更された
    Renamed { id: CustomerId, name: String },
}

impl Event for CustomerEvent {
    type Id = CustomerId;
}

/// 顧客エンティティ
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Customer {
    cpf: Cpf,
    name: String,
    id: CustomerId,
    statement: Vec<StatementEntry>,
    #[serde(skip)]
    events: EventQueue<CustomerEvent>,
}

impl Customer {
    pub fn open(id: CustomerId, cpf: Cpf, name: String) -> Result<Self, CustomerError> {
        let mut entity = Customer::default();
        let event = CustomerEvent::AccountOpened { id, cpf, name };
        entity.validate(&event)?;
        entity.apply(event);
        Ok(entity)
    }

    pub fn deposit(
        &mut self,
        amount: Money,
        description: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<(), CustomerError> {
        let event = CustomerEvent::Deposited {
            id: self.id,
            amount,
            description,
            created_at,
        };
        self.validate(&event)?;
        self.apply(event);
        Ok(())
    }

    pub fn withdraw(&mut self, amount: Money, created_at: DateTime<Utc>) -> Result<(), CustomerError> {
        let event = CustomerEvent::Withdrawn {
            id: self.id,
            amount,
            created_at,
        };
        self.validate(&event)?;
        self.apply(event);
        Ok(())
    }

    pub fn rename(&mut self, name: String) -> Result<(), CustomerError> {
        let event = CustomerEvent::Renamed { id: self.id, name };
        self.validate(&event)?;
        self.apply(event);
        Ok(())
    }

    pub fn cpf(&self) -> &Cpf {
        &self.cpf
    }

    pub fn name(&self) -> &String {
        &self.name
    }

    pub fn statement(&self) -> &[StatementEntry] {
        &self.statement
    }

    /// 指定日の明細のみを登録順で返す
    pub fn statement_on(&self, date: NaiveDate) -> Vec<StatementEntry> {
        self.statement
            .iter()
            .filter(|entry| entry.is_on(date))
            .cloned()
            .collect()
    }

    pub fn balance(&self) -> Result<Money, CustomerError> {
        balance(&self.statement).ok_or(CustomerError::BalanceOverflow)
    }

    fn validate_id(&self, id: &CustomerId) -> Result<(), CustomerError> {
        match self.id == *id {
            true => Ok(()),
            false => Err(CustomerError::MismatchedId),
        }
    }

    fn validate_opened(&self) -> Result<(), CustomerError> {
        match self.id.is_nil() {
            true => Ok(()),
            false => Err(CustomerError::AlreadyOpened),
        }
    }

    fn validate_deposited(&self, amount: &Money) -> Result<(), CustomerError> {
        self.balance()?
            .checked_add(*amount)
            .map(|_| ())
            .ok_or(CustomerError::BalanceOverflow)
    }

    fn validate_withdrawn(&self, amount: &Money) -> Result<(), CustomerError> {
        let balance = self.balance()?;
        if balance < *amount {
            return Err(CustomerError::InsufficientFunds);
        }
        // 負の金額の出金は残高を増やす
        balance
            .checked_sub(*amount)
            .map(|_| ())
            .ok_or(CustomerError::BalanceOverflow)
    }
}

impl Entity for Customer {
    type Id = CustomerId;
    type Event = CustomerEvent;
    type Error = CustomerError;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn validate(&self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            CustomerEvent::AccountOpened { .. } => self.validate_opened(),
            CustomerEvent::Withdrawn { id, amount, .. } => {
                self.validate_id(id)?;
                self.validate_withdrawn(amount)
            }
            CustomerEvent::Deposited { id, amount, .. } => {
                self.validate_id(id)?;
                self.validate_deposited(amount)
            }
            CustomerEvent::Renamed { id, .. } => self.validate_id(id),
        }
    }

    fn apply(&mut self, event: Self::Event) {
        if self.validate(&event).is_err() {
            return;
        }
        match &event {
            CustomerEvent::AccountOpened { id, cpf, name } => {
                self.id = *id;
                self.cpf = cpf.clone();
                self.name = name.clone();
            }
            CustomerEvent::Deposited {
                amount,
                description,
                created_at,
                ..
            } => {
                self.statement
                    .push(StatementEntry::credit(*amount, description.clone(), *created_at));
            }
            CustomerEvent::Withdrawn {
                amount, created_at, ..
            } => {
                self.statement
                    .push(StatementEntry::debit(*amount, *created_at));
            }
            CustomerEvent::Renamed { name, .. } => {
                self.name = name.clone();
            }
        }
        self.events.push(event);
    }

    fn entity_name() -> &'static str {
        "customer"
    }

    fn events(&self) -> &EventQueue<Self::Event> {
        &self.events
    }

    fn events_mut(&mut self) -> &mut EventQueue<Self::Event> {
        &mut self.events
    }
}

impl IntoIterator for Customer {
    type Item = CustomerEvent;
    type IntoIter = EventQueueIntoIter<Self::Item>;
    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl PartialEq for Customer {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.cpf == other.cpf
            && self.name == other.name
            && self.statement == other.statement
    }
}

impl Eq for Customer {}

/// 顧客エラー
#[derive(Error, Display, Debug, PartialEq, Eq)]
pub enum CustomerError {
    /// IDが一致しません
    #[display(fmt = "ID does not match")]
    MismatchedId,
    /// 口座は開設済みです
    #[display(fmt = "Account is already opened")]
    AlreadyOpened,
    /// 残高不足です
    #[display(fmt = "Insufficient funds")]
    InsufficientFunds,
    /// 残高が表現できる範囲を超えます
    #[display(fmt = "Amount out of range")]
    BalanceOverflow,
}
