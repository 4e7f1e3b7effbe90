//! End-to-end walk-through against a real DynamoDB endpoint: defines a
//! session table with two global indexes, provisions it, saves a couple of
//! records, queries a global index, reads one record back and deletes it.
//!
//! Needs AWS credentials and a region in the environment.

use anyhow::Result;
use dynatable::schema;
use dynatable::store::{Store, dynamo::DynamoRemote};
use dynatable::wire::WireType;

#[tokio::main]
async fn main() -> Result<()> {
    dynatable::logging::setup_tracing();

    let mut views = None;
    let descriptor = schema::describe("Sessions-Test", |t| {
        let id = t.key_attr("Id", WireType::String)?;
        let user_id = t.key_attr("UserId", WireType::String)?;
        let ip_addr = t.key_attr("IpAddr", WireType::String)?;
        let user_agent = t.non_key_attr("UserAgent", WireType::String)?;

        t.primary_key().hash(&id)?;

        let throughput = t.provisioned_throughput();
        throughput.write_capacity(1)?;
        throughput.read_capacity(1)?;

        let user_index = t.global_index("UserIndex")?;
        user_index.hash(&user_id)?;
        user_index.projection().all();
        let user_throughput = user_index.provisioned_throughput();
        user_throughput.write_capacity(1)?;
        user_throughput.read_capacity(1)?;

        let ip_index = t.global_index("IpAddrIndex")?;
        ip_index.hash(&ip_addr)?;
        ip_index.range(&id)?;
        ip_index.projection().all();
        let ip_throughput = ip_index.provisioned_throughput();
        ip_throughput.write_capacity(1)?;
        ip_throughput.read_capacity(1)?;

        views = Some((
            id.as_string()?,
            user_id.as_string()?,
            ip_addr.as_string()?,
            user_agent.as_string()?,
        ));
        Ok(())
    })?;
    let (id, user_id, ip_addr, user_agent) = views.expect("views are set by the callback");

    let store = Store::new(descriptor, DynamoRemote::from_env().await?);
    store.init().await?;

    for sid in ["sid:1", "sid:2"] {
        store
            .save(&[
                id.is(sid),
                user_id.is("uid:1"),
                user_agent.is("ua:ie"),
                ip_addr.is("127.0.0.1"),
            ])
            .await?;
    }

    // Query against the global secondary index.
    let user_index = store
        .descriptor()
        .global_index("UserIndex")
        .expect("UserIndex is defined above");
    let query = user_index.query([user_id.equals("uid:1")]);
    let sessions = store.find(&query).await?;
    println!("sessions of uid:1: {sessions:#?}");

    // Read a single record back.
    let key = store.descriptor().key(&[id.is("sid:1")])?;
    let item = store.get(&key).await?;
    println!("got user id    {}", user_id.from(&item)?);
    println!("got user agent {}", user_agent.from(&item)?);
    println!("got ip addr    {}", ip_addr.from(&item)?);

    store.delete(&key).await?;
    Ok(())
}
