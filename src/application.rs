//! 台帳サービス
//!
//! HTTP層など全てのクライアントはこのサービスを経由して顧客を操作する。
//! 顧客を必要とする操作は [`Ledger::resolve`] で存在確認を行う。

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::ledger::{
    Cpf, Customer, CustomerError, CustomerId, CustomerRepository, Money, StatementEntry,
};
use crate::domain::{DataAccessError, Entity};
use crate::infrastructure::ledger::InMemoryCustomerRepository;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Customer not found")]
    CustomerNotFound,
    #[error("Customer already exists")]
    DuplicateCustomer,
    #[error("Insufficient funds")]
    InsufficientFunds,
    #[error("Amount out of range")]
    AmountOutOfRange,
    #[error("{0}")]
    Customer(CustomerError),
    #[error(transparent)]
    DataAccess(#[from] DataAccessError),
}

impl From<CustomerError> for LedgerError {
    fn from(value: CustomerError) -> Self {
        match value {
            CustomerError::InsufficientFunds => Self::InsufficientFunds,
            CustomerError::BalanceOverflow => Self::AmountOutOfRange,
            _ => Self::Customer(value),
        }
    }
}

pub struct Ledger<R> {
    repository: R,
}

impl Ledger<InMemoryCustomerRepository> {
    /// 空のインメモリストアで台帳を作る
    pub fn in_memory() -> Self {
        Self::new(InMemoryCustomerRepository::new())
    }
}

impl<R: CustomerRepository> Ledger<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// CPFに一致する顧客を取得する。存在しなければ `CustomerNotFound`
    pub async fn resolve(&self, cpf: &Cpf) -> Result<Customer, LedgerError> {
        self.repository
            .find_by_cpf(cpf)
            .await?
            .ok_or(LedgerError::CustomerNotFound)
    }

    pub async fn open_account(&mut self, cpf: Cpf, name: String) -> Result<Customer, LedgerError> {
        if self.repository.find_by_cpf(&cpf).await?.is_some() {
            warn!(%cpf, "account already exists");
            return Err(LedgerError::DuplicateCustomer);
        }
        let mut customer = Customer::open(CustomerId::generate(), cpf, name)?;
        self.repository.save(&mut customer).await?;
        info!(cpf = %customer.cpf(), id = %customer.id(), "account opened");
        Ok(customer)
    }

    pub async fn statement(&self, cpf: &Cpf) -> Result<Vec<StatementEntry>, LedgerError> {
        Ok(self.resolve(cpf).await?.statement().to_vec())
    }

    pub async fn deposit(
        &mut self,
        cpf: &Cpf,
        amount: Money,
        description: Option<String>,
    ) -> Result<(), LedgerError> {
        let mut customer = self.resolve(cpf).await?;
        if let Err(e) = customer.deposit(amount, description, Utc::now()) {
            warn!(%cpf, %amount, "deposit rejected: {}", e);
            return Err(e.into());
        }
        self.repository.save(&mut customer).await?;
        info!(%cpf, %amount, "deposit");
        Ok(())
    }

    pub async fn withdraw(&mut self, cpf: &Cpf, amount: Money) -> Result<(), LedgerError> {
        let mut customer = self.resolve(cpf).await?;
        if let Err(e) = customer.withdraw(amount, Utc::now()) {
            warn!(%cpf, %amount, balance = ?customer.balance().ok(), "withdraw rejected: {}", e);
            return Err(e.into());
        }
        self.repository.save(&mut customer).await?;
        info!(%cpf, %amount, "withdraw");
        Ok(())
    }

    pub async fn rename(&mut self, cpf: &Cpf, name: String) -> Result<(), LedgerError> {
        let mut customer = self.resolve(cpf).await?;
        customer.rename(name)?;
        self.repository.save(&mut customer).await?;
        Ok(())
    }

    pub async fn account(&self, cpf: &Cpf) -> Result<Customer, LedgerError> {
        self.resolve(cpf).await
    }

    /// 顧客を削除し、残った顧客を登録順で返す
    pub async fn close_account(&mut self, cpf: &Cpf) -> Result<Vec<Customer>, LedgerError> {
        let mut customer = self.resolve(cpf).await?;
        self.repository.delete(&mut customer).await?;
        info!(%cpf, id = %customer.id(), "account closed");
        Ok(self.repository.find_all().await?)
    }

    pub async fn balance(&self, cpf: &Cpf) -> Result<Money, LedgerError> {
        Ok(self.resolve(cpf).await?.balance()?)
    }
}
