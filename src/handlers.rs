use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::Utc;
use log::{debug, info, warn};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{check_credentials, hash_password};
use crate::error::{AppError, Result};
use crate::models::{
    Tweet, TweetCreate, TweetRecord, TweetUpdate, User, UserLogin, UserRecord, UserRegister,
    UserUpdate,
};
use crate::state::AppState;

/// Registers every route on `cfg`. Shared by the server and the tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(home)
        .service(signup)
        .service(login)
        .service(list_users)
        .service(show_user)
        .service(delete_user)
        .service(update_user)
        .service(post_tweet)
        .service(show_tweet)
        .service(delete_tweet)
        .service(update_tweet);
}

/// Reports undecodable bodies with the same JSON shape as other errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("invalid id: {}", raw)))
}

async fn author_of(state: &AppState, record: &TweetRecord) -> Result<Option<User>> {
    Ok(state.users.get(record.by).await?.map(User::from))
}

#[get("/")]
pub async fn home(state: web::Data<AppState>) -> Result<HttpResponse> {
    let authors: HashMap<Uuid, User> = state
        .users
        .list()
        .await?
        .into_iter()
        .map(|record| (record.user_id, User::from(record)))
        .collect();

    let tweets: Vec<Tweet> = state
        .tweets
        .list()
        .await?
        .into_iter()
        .map(|record| {
            let author = authors.get(&record.by).cloned();
            Tweet::from_record(record, author)
        })
        .collect();

    debug!("Serving {} tweets", tweets.len());
    Ok(HttpResponse::Ok().json(tweets))
}

#[post("/signup")]
pub async fn signup(
    state: web::Data<AppState>,
    body: web::Json<UserRegister>,
) -> Result<HttpResponse> {
    let register = body.into_inner();
    register.validate()?;

    let password_hash = hash_password(&register.password, state.bcrypt_cost)?;
    let record = state
        .users
        .append(UserRecord::new(register, password_hash))
        .await?;

    info!("User created successfully: {}", record.user_id);
    Ok(HttpResponse::Created().json(User::from(record)))
}

#[post("/login")]
pub async fn login(state: web::Data<AppState>, body: web::Json<UserLogin>) -> Result<HttpResponse> {
    let credentials = body.into_inner();
    credentials.validate()?;

    let user = state
        .users
        .list()
        .await?
        .into_iter()
        .find(|user| user.email == credentials.email);

    let verified = check_credentials(user.as_ref(), &credentials.password, state.bcrypt_cost);
    match user {
        Some(user) if verified => {
            info!("User logged in: {}", user.user_id);
            Ok(HttpResponse::Ok().json(User::from(user)))
        }
        _ => {
            warn!("Rejected login for {}", credentials.email);
            Err(AppError::Unauthorized("invalid email or password".to_string()))
        }
    }
}

#[get("/users")]
pub async fn list_users(state: web::Data<AppState>) -> Result<HttpResponse> {
    let users: Vec<User> = state
        .users
        .list()
        .await?
        .into_iter()
        .map(User::from)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

#[get("/users/{user_id}")]
pub async fn show_user(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = parse_id(&user_id)?;
    match state.users.get(user_id).await? {
        Some(user) => Ok(HttpResponse::Ok().json(User::from(user))),
        None => Err(AppError::NotFound(format!("user {}", user_id))),
    }
}

#[delete("/users/{user_id}/delete")]
pub async fn delete_user(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = parse_id(&user_id)?;
    match state.users.delete(user_id).await? {
        Some(user) => {
            info!("User deleted: {}", user_id);
            Ok(HttpResponse::Ok().json(User::from(user)))
        }
        None => Err(AppError::NotFound(format!("user {}", user_id))),
    }
}

#[put("/users/{user_id}/update")]
pub async fn update_user(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    body: web::Json<UserUpdate>,
) -> Result<HttpResponse> {
    let user_id = parse_id(&user_id)?;
    let update = body.into_inner();
    update.validate()?;

    let user = state
        .users
        .update(user_id, Box::new(move |user: &mut UserRecord| user.apply(update)))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))?;

    info!("User updated: {}", user_id);
    Ok(HttpResponse::Ok().json(User::from(user)))
}

#[post("/post")]
pub async fn post_tweet(
    state: web::Data<AppState>,
    body: web::Json<TweetCreate>,
) -> Result<HttpResponse> {
    let draft = body.into_inner();
    draft.validate()?;

    let record = state.tweets.append(TweetRecord::new(draft, Utc::now())).await?;
    let author = author_of(&state, &record).await?;
    if author.is_none() {
        debug!("Tweet {} references unknown user {}", record.tweet_id, record.by);
    }

    info!("Tweet created successfully: {}", record.tweet_id);
    Ok(HttpResponse::Created().json(Tweet::from_record(record, author)))
}

#[get("/tweets/{tweet_id}")]
pub async fn show_tweet(
    state: web::Data<AppState>,
    tweet_id: web::Path<String>,
) -> Result<HttpResponse> {
    let tweet_id = parse_id(&tweet_id)?;
    let record = state
        .tweets
        .get(tweet_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("tweet {}", tweet_id)))?;
    let author = author_of(&state, &record).await?;
    Ok(HttpResponse::Ok().json(Tweet::from_record(record, author)))
}

#[delete("/tweets/{tweet_id}/delete")]
pub async fn delete_tweet(
    state: web::Data<AppState>,
    tweet_id: web::Path<String>,
) -> Result<HttpResponse> {
    let tweet_id = parse_id(&tweet_id)?;
    let record = state
        .tweets
        .delete(tweet_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("tweet {}", tweet_id)))?;

    info!("Tweet deleted: {}", tweet_id);
    let author = author_of(&state, &record).await?;
    Ok(HttpResponse::Ok().json(Tweet::from_record(record, author)))
}

#[put("/tweets/{tweet_id}/update")]
pub async fn update_tweet(
    state: web::Data<AppState>,
    tweet_id: web::Path<String>,
    body: web::Json<TweetUpdate>,
) -> Result<HttpResponse> {
    let tweet_id = parse_id(&tweet_id)?;
    let update = body.into_inner();
    update.validate()?;

    let now = Utc::now();
    let record = state
        .tweets
        .update(tweet_id, Box::new(move |record: &mut TweetRecord| record.edit(update, now)))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("tweet {}", tweet_id)))?;

    info!("Tweet updated: {}", tweet_id);
    let author = author_of(&state, &record).await?;
    Ok(HttpResponse::Ok().json(Tweet::from_record(record, author)))
}
