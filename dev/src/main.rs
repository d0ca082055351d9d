use std::env;

use active_bean::{Database, Entity, Record};
use rand::Rng;

#[derive(Entity, Debug, Clone)]
struct Test {
    int_value: i32,
    string_value: String,
    random: i32,
    random2: i32,
    tags: Vec<String>,
}

impl Test {
    fn new() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            int_value: 666,
            string_value: "test".to_string(),
            random: rng.gen_range(1..=100),
            random2: rng.gen_range(1..=1000),
            tags: vec!["demo".to_string()],
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());
    let db = Database::builder().max_connections(1).connect(&database_url).await?;

    // First run dispenses a new row, later runs find and update it
    let mut test = db.active(Test::new());
    let id = test.upsert_by("IntValue_and_StringValue", &[]).await?.prepare()?.save().await?;
    println!("Stored test #{} (new: {})", id, test.is_new());

    // Same lookup again, served from the cache
    let mut again = db.active(Test::new());
    again.load_by("IntValue_and_StringValue", &[]).await?;
    println!("Loaded test: random = {:?}", again.get("Random"));

    again.set("note", "touched by the demo")?;
    again.list("Log", Record::new("log").with("message", "loaded"))?;
    again.save().await?;
    println!("Fields: {:?}", again.fields());

    db.close().await?;
    Ok(())
}
