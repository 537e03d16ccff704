use chrono::Utc;
use env_logger::Builder;
use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use log::info;
use std::error::Error;
use uuid::Uuid;

use twitter_api::auth::hash_password;
use twitter_api::config::Config;
use twitter_api::models::{AuthorRef, TweetCreate, TweetRecord, UserRecord, UserRegister};
use twitter_api::store::{JsonFileStore, RecordStore};

const SEED_PASSWORD: &str = "password123";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::from_env()?;
    Builder::new()
        .filter_level(config.log_level)
        .format_timestamp_secs()
        .init();

    info!("Starting data seeding into {}", config.data_dir.display());

    let users = JsonFileStore::new(config.users_path());
    let tweets = JsonFileStore::new(config.tweets_path());
    users.ensure_exists().await?;
    tweets.ensure_exists().await?;

    let num_users = 100;
    let tweets_per_user = 20;

    let user_ids = seed_users(&users, num_users, config.bcrypt_cost).await?;
    seed_tweets(&tweets, &user_ids, tweets_per_user).await?;

    info!("Seeding completed!");
    Ok(())
}

async fn seed_users(
    store: &JsonFileStore<UserRecord>,
    count: usize,
    cost: u32,
) -> Result<Vec<Uuid>, Box<dyn Error>> {
    info!("Creating {} users...", count);
    // Hashed once; every seeded account shares the same password.
    let password_hash = hash_password(SEED_PASSWORD, cost)?;
    let mut users = Vec::with_capacity(count);

    for i in 0..count {
        let register = UserRegister {
            email: SafeEmail().fake(),
            first_name: FirstName().fake(),
            last_name: LastName().fake(),
            birth_date: None,
            password: SEED_PASSWORD.to_string(),
        };
        let user = store
            .append(UserRecord::new(register, password_hash.clone()))
            .await?;

        info!(
            "Created user {}/{}: {} ({})",
            i + 1,
            count,
            user.email,
            user.user_id
        );
        users.push(user.user_id);
    }

    Ok(users)
}

async fn seed_tweets(
    store: &JsonFileStore<TweetRecord>,
    users: &[Uuid],
    tweets_per_user: usize,
) -> Result<(), Box<dyn Error>> {
    info!("Creating {} tweets per user...", tweets_per_user);
    let total_tweets = users.len() * tweets_per_user;
    let mut current_tweet = 0;

    for &user_id in users {
        for _ in 0..tweets_per_user {
            let draft = TweetCreate {
                content: Sentence(3..10).fake(),
                by: AuthorRef { user_id },
            };
            store.append(TweetRecord::new(draft, Utc::now())).await?;

            current_tweet += 1;
            if current_tweet % 100 == 0 {
                info!("Created {}/{} tweets", current_tweet, total_tweets);
            }
        }
    }

    Ok(())
}
