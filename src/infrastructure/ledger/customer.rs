use async_trait::async_trait;
use tracing::debug;

use crate::domain::ledger::{Cpf, Customer, CustomerEvent, CustomerId, CustomerRepository};
use crate::domain::{DataAccessError, Entity};
use crate::infrastructure::{
    from_event, stream_name, try_from_recorded_event, EventConvertError, EventData,
    ExpectedRevision, InMemoryEventStore, RecordedEvent, StreamError,
};

/// イベントストリームで顧客を保持するリポジトリ
///
/// CPFの索引は登録順に並び、削除は索引上の位置で行う。
#[derive(Clone, Debug, Default)]
pub struct InMemoryCustomerRepository {
    store: InMemoryEventStore,
    index: Vec<(Cpf, CustomerId)>,
}

impl InMemoryCustomerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn replay(&self, id: CustomerId) -> Result<Option<Customer>, DataAccessError> {
        let stream = match self.store.read_stream(&stream_name::<Customer>(id)) {
            Ok(stream) => stream,
            Err(StreamError::ResourceNotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut entity = Customer::default();
        for recorded in stream {
            let event = CustomerEvent::try_from(recorded)?;
            // 記録済みのイベントが適用できない場合は読み飛ばさずにエラーとする
            entity
                .validate(&event)
                .map_err(|e| DataAccessError::ReadError(Box::new(e)))?;
            entity.apply(event);
        }
        if entity.peek().is_none() {
            Ok(None)
        } else {
            entity.clear();
            Ok(Some(entity))
        }
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn find_by_cpf(&self, cpf: &Cpf) -> Result<Option<Customer>, DataAccessError> {
        match self.index.iter().find(|(c, _)| c == cpf) {
            Some((_, id)) => self.replay(*id),
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> Result<Vec<Customer>, DataAccessError> {
        let mut customers = Vec::with_capacity(self.index.len());
        for (_, id) in &self.index {
            if let Some(customer) = self.replay(*id)? {
                customers.push(customer);
            }
        }
        Ok(customers)
    }

    async fn save(&mut self, entity: &mut Customer) -> Result<bool, DataAccessError> {
        let stream_name = stream_name::<Customer>(entity.id());
        let rev = match entity.peek() {
            Some(CustomerEvent::AccountOpened { .. }) => ExpectedRevision::NoStream,
            Some(_) => ExpectedRevision::StreamExists,
            None => return Ok(false),
        };
        let events = entity
            .pop_all()
            .into_iter()
            .map(EventData::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let revision = self.store.append_to_stream(&stream_name, rev, events)?;
        if rev == ExpectedRevision::NoStream {
            self.index.push((entity.cpf().clone(), entity.id()));
        }
        debug!(stream = %stream_name, revision, "customer events appended");
        Ok(true)
    }

    async fn delete(&mut self, entity: &mut Customer) -> Result<bool, DataAccessError> {
        let position = match self.index.iter().position(|(_, id)| *id == entity.id()) {
            Some(position) => position,
            None => return Ok(false),
        };
        self.index.remove(position);
        self.store
            .delete_stream(&stream_name::<Customer>(entity.id()))?;
        entity.clear();
        Ok(true)
    }
}

impl TryFrom<CustomerEvent> for EventData {
    type Error = EventConvertError;

    fn try_from(value: CustomerEvent) -> Result<Self, Self::Error> {
        from_event(value)
    }
}

impl TryFrom<&RecordedEvent> for CustomerEvent {
    type Error = EventConvertError;

    fn try_from(value: &RecordedEvent) -> Result<Self, Self::Error> {
        try_from_recorded_event(value)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::json;

    use crate::domain::ledger::Money;

    use super::*;

    fn customer(cpf: &str, name: &str) -> Customer {
        Customer::open(CustomerId::generate(), cpf.into(), name.to_owned()).unwrap()
    }

    #[tokio::test]
    async fn test_repository() {
        let mut repo = InMemoryCustomerRepository::new();

        // エンティティ生成
        let mut entity = customer("111", "Alice");
        entity
            .deposit(dec!(100).into(), Some("salary".to_owned()), Utc::now())
            .unwrap();
        entity.withdraw(dec!(30.25).into(), Utc::now()).unwrap();

        // エンティティ登録確認
        assert!(repo.save(&mut entity).await.unwrap());
        assert!(entity.peek().is_none());
        let found = repo.find_by_cpf(&"111".into()).await.unwrap().unwrap();
        assert_eq!(found, entity);
        assert!(found.peek().is_none());
        assert_eq!(found.balance().unwrap(), Money::from(dec!(69.75)));

        // 更新確認
        let mut found = found;
        found.rename("Alicia".to_owned()).unwrap();
        assert!(repo.save(&mut found).await.unwrap());
        assert!(!repo.save(&mut found).await.unwrap());
        assert_eq!(
            repo.find_by_cpf(&"111".into()).await.unwrap().unwrap().name(),
            "Alicia"
        );

        // エンティティ削除確認
        assert!(repo.delete(&mut found).await.unwrap());
        assert_eq!(repo.find_by_cpf(&"111".into()).await.unwrap(), None);
        assert!(!repo.delete(&mut found).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_position() {
        let mut repo = InMemoryCustomerRepository::new();
        let mut alice = customer("111", "Alice");
        let mut bob = customer("222", "Bob");
        let mut carol = customer("333", "Carol");
        repo.save(&mut alice).await.unwrap();
        repo.save(&mut bob).await.unwrap();
        repo.save(&mut carol).await.unwrap();

        repo.delete(&mut bob).await.unwrap();
        let names = repo
            .find_all()
            .await
            .unwrap()
            .iter()
            .map(|c| c.name().clone())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Alice", "Carol"]);
    }

    #[tokio::test]
    async fn test_save_unopened_stream() {
        let mut repo = InMemoryCustomerRepository::new();
        let mut entity = customer("111", "Alice");
        entity.clear();
        entity.rename("Alicia".to_owned()).unwrap();
        assert!(matches!(
            repo.save(&mut entity).await,
            Err(DataAccessError::WriteError(_))
        ));
        assert!(repo.find_all().await.unwrap().is_empty());
    }

    #[test]
    fn test_event_data_from() {
        let event = CustomerEvent::Deposited {
            id: CustomerId::generate(),
            amount: dec!(1500).into(),
            description: Some("salary".to_owned()),
            created_at: Utc.with_ymd_and_hms(2023, 4, 1, 9, 30, 0).unwrap(),
        };
        let expected = EventData {
            event_type: "Deposited".to_owned(),
            data: json!({
                "amount": "1500",
                "description": "salary",
                "created_at": "2023-04-01T09:30:00Z",
            }),
        };
        assert_eq!(EventData::try_from(event).unwrap(), expected);
    }

    #[test]
    fn test_event_try_from() {
        let id = CustomerId::generate();
        let recorded = RecordedEvent {
            stream_id: format!("customer-{}", id),
            event_type: "Withdrawn".to_owned(),
            data: json!({
                "amount": "12.5",
                "created_at": "2023-04-01T09:30:00Z",
            }),
        };
        let expected = CustomerEvent::Withdrawn {
            id,
            amount: dec!(12.5).into(),
            created_at: Utc.with_ymd_and_hms(2023, 4, 1, 9, 30, 0).unwrap(),
        };
        assert_eq!(CustomerEvent::try_from(&recorded).ok(), Some(expected));
    }

    #[tokio::test]
    async fn test_amounts_survive_replay() {
        let mut repo = InMemoryCustomerRepository::new();
        let mut entity = customer("111", "Alice");
        repo.save(&mut entity).await.unwrap();

        let mut amounts = vec![
            dec!(32.84512896059999),
            dec!(0.189353394199999),
            dec!(0.3333333333333333333333333333),
            Decimal::ONE / Decimal::from(7),
        ];
        // 線形合同法で桁数と小数位の異なる金額を作る
        let mut seed: i128 = 20230401;
        for _ in 0..200 {
            seed = (seed * 6364136223846793005 + 1442695040888963407) % (1 << 63);
            amounts.push(Decimal::from_i128_with_scale(
                seed % 10_i128.pow(16),
                (seed % 16) as u32,
            ));
        }

        let mut expected = Decimal::ZERO;
        for amount in amounts {
            entity.deposit(amount.into(), None, Utc::now()).unwrap();
            expected += amount;
            repo.save(&mut entity).await.unwrap();

            // 入金直後の残高全額を出金しても再生後に明細が欠けない
            entity.withdraw(expected.into(), Utc::now()).unwrap();
            expected = Decimal::ZERO;
            repo.save(&mut entity).await.unwrap();

            let found = repo.find_by_cpf(&"111".into()).await.unwrap().unwrap();
            assert_eq!(found, entity);
            assert_eq!(found.balance().unwrap(), Money::from(expected));
            entity = found;
        }
        assert_eq!(entity.statement().len(), 2 * 204);
    }

    #[tokio::test]
    async fn test_replay_rejects_invalid_stream() {
        let mut repo = InMemoryCustomerRepository::new();
        let mut entity = customer("111", "Alice");
        repo.save(&mut entity).await.unwrap();

        let overdraft = CustomerEvent::Withdrawn {
            id: entity.id(),
            amount: dec!(1).into(),
            created_at: Utc::now(),
        };
        repo.store
            .append_to_stream(
                &stream_name::<Customer>(entity.id()),
                ExpectedRevision::StreamExists,
                [EventData::try_from(overdraft).unwrap()],
            )
            .unwrap();
        assert!(matches!(
            repo.find_by_cpf(&"111".into()).await,
            Err(DataAccessError::ReadError(_))
        ));
    }
}
