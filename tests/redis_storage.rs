use email_otp_gate::{OtpCheck, RedisStorage, Storage};
use std::sync::Arc;
use uuid::Uuid;

fn redis_url() -> String {
    if let Ok(url) = std::env::var("REDIS_URL") {
        return url;
    }
    match std::env::var("REDIS_HOST") {
        Ok(host) => format!("redis://{}:6379/", host),
        Err(_) => "redis://127.0.0.1/".to_string(),
    }
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn test_redis_round_trip() {
    let storage = Arc::new(RedisStorage::new(&redis_url()).unwrap());
    let key = format!("otp:{}@example.com", Uuid::new_v4());

    storage.set(&key, "4821", 300).await.unwrap();
    assert_eq!(storage.get(&key).await.unwrap(), Some("4821".to_string()));
    let ttl = storage.ttl(&key).await.unwrap().unwrap();
    assert!(ttl > 295 && ttl <= 300);

    storage.delete(&[key.clone()]).await.unwrap();
    assert_eq!(storage.get(&key).await.unwrap(), None);
    assert_eq!(storage.ttl(&key).await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn test_redis_increment_capped() {
    let storage = Arc::new(RedisStorage::new(&redis_url()).unwrap());
    let key = format!("otp_attempts:{}@example.com", Uuid::new_v4());

    assert_eq!(storage.increment_capped(&key, 2, 300).await.unwrap(), Some(1));
    assert_eq!(storage.increment_capped(&key, 2, 300).await.unwrap(), Some(2));
    assert_eq!(storage.increment_capped(&key, 2, 300).await.unwrap(), None);
    assert_eq!(storage.get(&key).await.unwrap(), Some("2".to_string()));
    assert!(storage.ttl(&key).await.unwrap().is_some());

    storage.delete(&[key]).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn test_redis_check_otp() {
    let storage = Arc::new(RedisStorage::new(&redis_url()).unwrap());
    let email = format!("{}@example.com", Uuid::new_v4());
    let otp_key = format!("otp:{}", email);
    let attempts_key = format!("otp_attempts:{}", email);
    storage.set(&otp_key, "4821", 300).await.unwrap();

    let check = |code: &'static str| {
        let storage = storage.clone();
        let (otp_key, attempts_key) = (otp_key.clone(), attempts_key.clone());
        async move {
            storage
                .check_otp(&otp_key, &attempts_key, code, 2, 300)
                .await
                .unwrap()
        }
    };

    assert_eq!(check("0000").await, OtpCheck::Failed(1));
    assert_eq!(check("1111").await, OtpCheck::Failed(2));
    assert_eq!(check("2222").await, OtpCheck::Exhausted);
    assert_eq!(storage.get(&otp_key).await.unwrap(), None);
    assert_eq!(storage.get(&attempts_key).await.unwrap(), None);
    assert_eq!(check("4821").await, OtpCheck::Missing);

    storage.set(&otp_key, "4821", 300).await.unwrap();
    assert_eq!(check("4821").await, OtpCheck::Matched);
    assert_eq!(storage.get(&otp_key).await.unwrap(), None);
}
