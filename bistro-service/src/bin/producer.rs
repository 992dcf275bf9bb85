use std::env;
use std::{thread::sleep, time::Duration};

use anyhow::Context;
use bistro_service::models::Outbox;
use bistro_service::{establish_connection, schema};
use diesel::result::Error as DieselError;
use diesel::{
    Connection, ExpressionMethods, OptionalExtension, PgConnection, QueryDsl, RunQueryDsl,
    SelectableHelper,
};
use dotenvy::dotenv;
use kafka::client::RequiredAcks;
use kafka::producer::{Producer, Record};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

const IDLE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
enum RelayError {
    #[error("database error: {0}")]
    Database(#[from] DieselError),
    #[error("kafka error: {0}")]
    Kafka(kafka::Error),
}

struct OutboxRelay {
    kafka: Producer,
}

impl OutboxRelay {
    /// Publishes the oldest unclaimed outbox row. Returns `false` when the
    /// outbox is empty.
    fn relay_next(&mut self, conn: &mut PgConnection) -> Result<bool, RelayError> {
        use schema::outbox::dsl::*;

        conn.transaction::<_, RelayError, _>(|conn| {
            let Some(row) = outbox
                .select(Outbox::as_select())
                .order(id.asc())
                .for_update()
                .skip_locked()
                .first::<Outbox>(conn)
                .optional()?
            else {
                return Ok(false);
            };

            self.kafka.send(&Record::from_key_value(
                &row.topic,
                row.key.clone(),
                row.value.clone(),
            ))
            .map_err(RelayError::Kafka)?;
            diesel::delete(outbox.filter(id.eq(row.id))).execute(conn)?;
            debug!(outbox_id = row.id, topic = %row.topic, key = %row.key, "event published");

            Ok(true)
        })
    }
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let kafka_url = env::var("KAFKA_URL").context("KAFKA_URL must be set")?;
    let conn = &mut establish_connection()?;
    let producer = Producer::from_hosts(vec![kafka_url.clone()])
        .with_ack_timeout(Duration::from_secs(1))
        .with_required_acks(RequiredAcks::One)
        .create()
        .map_err(|err| anyhow::anyhow!("Cannot connect to kafka at {kafka_url}: {err}"))?;

    let mut relay = OutboxRelay { kafka: producer };
    info!(%kafka_url, "outbox relay started");

    loop {
        match relay.relay_next(conn) {
            Ok(true) => {}
            Ok(false) => sleep(IDLE_INTERVAL),
            Err(err) => {
                error!(error = %err, "error relaying outbox row");
                sleep(IDLE_INTERVAL);
            }
        }
    }
}
