use std::collections::HashMap;
use std::sync::Arc;

use aws_lambda_events::event::dynamodb::Event;
use aws_sdk_dynamodb::types::AttributeValue;
use lambda_runtime::Error;
use serde::Deserialize;
use serde_dynamo::aws_sdk_dynamodb_1::from_item;
use shared::models::change::{ChangeKind, MatchChange};
use shared::models::frames::ServerFrame;
use shared::models::match_record::Match;
use shared::repositories::connection_repository::ConnectionRepository;
use shared::repositories::errors::connection_repository_errors::ConnectionRepositoryError;
use tracing::{debug, error, info, warn};

type Image = HashMap<String, AttributeValue>;

#[derive(Deserialize)]
struct MatchKey {
    id: String,
}

/// Builds the change-feed notification for one stream record of the matches
/// table. Returns `None` for event names the feed does not carry.
pub fn match_change(
    event_name: &str,
    keys: Image,
    new_image: Image,
    old_image: Image,
) -> Result<Option<MatchChange>, Error> {
    let kind = match ChangeKind::from_stream_event(event_name) {
        Some(kind) => kind,
        None => return Ok(None),
    };

    let change = match kind {
        ChangeKind::Delete => {
            let key: MatchKey = from_item(keys)?;
            let last_known: Option<Match> = if old_image.is_empty() {
                None
            } else {
                Some(from_item(old_image)?)
            };
            MatchChange::deleted(&key.id, last_known)
        }
        _ => {
            let record: Match = from_item(new_image)?;
            MatchChange::upserted(kind, &record)
        }
    };
    Ok(Some(change))
}

#[derive(Clone)]
pub struct MatchNotifier {
    connections: Arc<dyn ConnectionRepository>,
}

impl MatchNotifier {
    pub fn new(connections: Arc<dyn ConnectionRepository>) -> Self {
        Self { connections }
    }

    pub async fn process_event(&self, event: Event) -> Result<(), Error> {
        info!("Processing {} records", event.records.len());

        for record in event.records {
            let event_name = record.event_name.clone();
            let change = match match_change(
                &event_name,
                record.change.keys.into(),
                record.change.new_image.into(),
                record.change.old_image.into(),
            ) {
                Ok(Some(change)) => change,
                Ok(None) => {
                    warn!("Unhandled event type: {}", event_name);
                    continue;
                }
                Err(e) => {
                    error!("Failed to decode {} record: {}", event_name, e);
                    continue;
                }
            };

            self.notify(&change).await?;
        }

        Ok(())
    }

    /// Posts a change to every connection following its match and returns
    /// how many received it.
    pub async fn notify(&self, change: &MatchChange) -> Result<usize, Error> {
        let subscribers = self
            .connections
            .connections_for_match(&change.match_id)
            .await?;
        if subscribers.is_empty() {
            debug!("No subscribers for match {}", change.match_id);
            return Ok(0);
        }

        let message = ServerFrame::MatchChange(change.clone()).to_json()?;
        let mut delivered = 0;
        for subscriber in subscribers {
            match self
                .connections
                .send_message(&subscriber.connection_id, &message)
                .await
            {
                Ok(()) => delivered += 1,
                Err(ConnectionRepositoryError::Gone(id)) => {
                    info!("Removing gone connection {}", id);
                    if let Err(e) = self.connections.remove_connection(&id).await {
                        error!("Failed to remove connection {}: {}", id, e);
                    }
                }
                Err(e) => {
                    error!(
                        "Failed to notify {} about match {}: {}",
                        subscriber.connection_id, change.match_id, e
                    );
                }
            }
        }

        info!(
            "Delivered {:?} of match {} to {} connections",
            change.kind, change.match_id, delivered
        );
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use serde_dynamo::to_item;
    use shared::models::connection::Connection;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeConnections {
        subscribers: Mutex<Vec<Connection>>,
        gone: Vec<String>,
        sent: Mutex<Vec<(String, String)>>,
        removed: Mutex<Vec<String>>,
    }

    impl FakeConnections {
        fn following(match_id: &str, ids: &[&str], gone: &[&str]) -> Self {
            let subscribers = ids
                .iter()
                .map(|id| {
                    let mut connection = Connection::new(id, "player");
                    connection.match_id = Some(match_id.to_string());
                    connection
                })
                .collect();
            FakeConnections {
                subscribers: Mutex::new(subscribers),
                gone: gone.iter().map(|id| id.to_string()).collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl ConnectionRepository for FakeConnections {
        async fn store_connection(&self, _: &str, _: &str) -> Result<(), ConnectionRepositoryError> {
            Ok(())
        }

        async fn remove_connection(
            &self,
            connection_id: &str,
        ) -> Result<(), ConnectionRepositoryError> {
            self.removed.lock().unwrap().push(connection_id.to_string());
            Ok(())
        }

        async fn get_connection(&self, _: &str) -> Result<Connection, ConnectionRepositoryError> {
            Err(ConnectionRepositoryError::NotFound)
        }

        async fn subscribe(&self, _: &str, _: &str) -> Result<(), ConnectionRepositoryError> {
            Ok(())
        }

        async fn unsubscribe(&self, _: &str) -> Result<(), ConnectionRepositoryError> {
            Ok(())
        }

        async fn connections_for_match(
            &self,
            match_id: &str,
        ) -> Result<Vec<Connection>, ConnectionRepositoryError> {
            Ok(self
                .subscribers
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.match_id.as_deref() == Some(match_id))
                .cloned()
                .collect())
        }

        async fn send_message(
            &self,
            connection_id: &str,
            message: &str,
        ) -> Result<(), ConnectionRepositoryError> {
            if self.gone.iter().any(|id| id == connection_id) {
                return Err(ConnectionRepositoryError::Gone(connection_id.to_string()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((connection_id.to_string(), message.to_string()));
            Ok(())
        }
    }

    fn active_match() -> Match {
        let mut record = Match::new_waiting("alice", "10+10", Duration::seconds(60));
        record.pair("bob").unwrap();
        record
    }

    fn key_of(record: &Match) -> Image {
        HashMap::from([("id".to_string(), AttributeValue::S(record.id.clone()))])
    }

    #[test]
    fn test_modify_record_becomes_update() {
        let record = active_match();
        let image: Image = to_item(&record).unwrap();

        let change = match_change("MODIFY", key_of(&record), image, Image::new())
            .unwrap()
            .unwrap();

        assert_eq!(change.kind, ChangeKind::Update);
        assert_eq!(change.match_id, record.id);
        assert_eq!(change.record, Some(record));
    }

    #[test]
    fn test_remove_record_uses_keys_and_old_image() {
        let record = active_match();

        let without_image = match_change("REMOVE", key_of(&record), Image::new(), Image::new())
            .unwrap()
            .unwrap();
        assert_eq!(without_image.kind, ChangeKind::Delete);
        assert_eq!(without_image.match_id, record.id);
        assert!(without_image.record.is_none());

        let old_image: Image = to_item(&record).unwrap();
        let with_image = match_change("REMOVE", key_of(&record), Image::new(), old_image)
            .unwrap()
            .unwrap();
        assert_eq!(with_image.record, Some(record));
    }

    #[test]
    fn test_unknown_event_is_skipped() {
        let record = active_match();

        let change = match_change("TRUNCATE", key_of(&record), Image::new(), Image::new()).unwrap();

        assert!(change.is_none());
    }

    #[tokio::test]
    async fn test_notify_fans_out_and_drops_gone_connections() {
        let record = active_match();
        let connections = Arc::new(FakeConnections::following(
            &record.id,
            &["conn-1", "conn-2", "conn-3"],
            &["conn-2"],
        ));
        let notifier = MatchNotifier::new(connections.clone());

        let delivered = notifier
            .notify(&MatchChange::upserted(ChangeKind::Update, &record))
            .await
            .unwrap();

        assert_eq!(delivered, 2);
        assert_eq!(*connections.removed.lock().unwrap(), vec!["conn-2".to_string()]);
        let sent = connections.sent.lock().unwrap();
        let frame: serde_json::Value = serde_json::from_str(&sent[0].1).unwrap();
        assert_eq!(frame["action"], "match_change");
        assert_eq!(frame["kind"], "update");
        assert_eq!(frame["record"]["player2_id"], "bob");
    }

    #[tokio::test]
    async fn test_notify_without_subscribers() {
        let record = active_match();
        let notifier = MatchNotifier::new(Arc::new(FakeConnections::default()));

        let delivered = notifier
            .notify(&MatchChange::deleted(&record.id, None))
            .await
            .unwrap();

        assert_eq!(delivered, 0);
    }
}
