//! Defines the "Threads" table — composite primary key, one local and one
//! global secondary index — and prints the frozen descriptor.
//!
//! Runs entirely offline: no remote store is contacted.

use anyhow::Result;
use dynatable::schema;
use dynatable::wire::WireType;

fn main() -> Result<()> {
    dynatable::logging::setup_tracing();

    let descriptor = schema::describe("Threads", |t| {
        let forum_name = t.key_attr("ForumName", WireType::String)?;
        let subject = t.key_attr("Subject", WireType::String)?;
        let created = t.key_attr("Created", WireType::Number)?;
        let user_id = t.key_attr("UserId", WireType::String)?;

        let pk = t.primary_key();
        pk.hash(&forum_name)?;
        pk.range(&created)?;

        let throughput = t.provisioned_throughput();
        throughput.write_capacity(1)?;
        throughput.read_capacity(1)?;

        let other = t.local_index("OtherIndex")?;
        other.range(&subject)?;
        other.projection().all();

        let user = t.global_index("UserIndex")?;
        user.hash(&user_id)?;
        user.range(&forum_name)?;
        user.projection().include(&[&subject])?;
        let user_throughput = user.provisioned_throughput();
        user_throughput.write_capacity(1)?;
        user_throughput.read_capacity(1)?;

        Ok(())
    })?;

    println!("{descriptor:#?}");
    Ok(())
}
