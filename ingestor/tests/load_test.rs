use rand::Rng;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::time::sleep;

const BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Deserialize)]
struct Device {
    id: i64,
    name: String,
}

async fn register(client: &reqwest::Client, name: &str) -> Device {
    client
        .post(format!("{}/device", BASE_URL))
        .query(&[("name", name)])
        .send()
        .await
        .unwrap()
        .error_for_status()
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn post_random_reading(client: &reqwest::Client, device_id: i64) -> reqwest::Result<()> {
    let (x, y, z) = {
        let mut rng = rand::thread_rng();
        (
            rng.gen_range(-10.0..10.0),
            rng.gen_range(-10.0..10.0),
            rng.gen_range(-10.0..10.0),
        )
    };

    client
        .post(format!("{}/device/{}/data", BASE_URL, device_id))
        .query(&[("x", x), ("y", y), ("z", z)])
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}

#[tokio::test]
#[ignore]
async fn test_200_readings_per_second() {
    println!("\n🚀 Starting Load Test: 200 readings/s");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let test_duration_secs = 10;
    let target_rate = 200;
    let total_readings = test_duration_secs * target_rate;

    let client = reqwest::Client::new();
    let suffix: u32 = rand::thread_rng().gen();
    let mut devices = Vec::new();
    for i in 0..10 {
        devices.push(register(&client, &format!("load-test-{}-{}", suffix, i)).await);
    }

    println!("\n📊 Test Configuration:");
    println!("  Target Rate:    {} readings/s", target_rate);
    println!("  Duration:       {} seconds", test_duration_secs);
    println!("  Total Readings: {}", total_readings);
    println!("  Devices:        {}", devices.len());

    let start = Instant::now();
    let mut sent_count = 0;
    let mut error_count = 0;

    let burst_size = 20;
    let delay_per_burst = Duration::from_micros((burst_size * 1_000_000) / target_rate as u64);

    for burst_start in (0..total_readings).step_by(burst_size as usize) {
        for i in burst_start..std::cmp::min(burst_start + burst_size as usize, total_readings) {
            let device = &devices[i % devices.len()];
            match post_random_reading(&client, device.id).await {
                Ok(()) => sent_count += 1,
                Err(e) => {
                    error_count += 1;
                    if error_count < 10 {
                        eprintln!("Send error for {}: {}", device.name, e);
                    }
                }
            }
        }

        sleep(delay_per_burst).await;
    }

    let duration = start.elapsed();

    println!("\n✅ Test Complete!");
    println!("  Total Sent:     {}", sent_count);
    println!("  Errors:         {}", error_count);
    println!("  Duration:       {:.2}s", duration.as_secs_f64());

    let mut counted = 0;
    for device in &devices {
        let body: serde_json::Value = client
            .get(format!("{}/device/{}/analytics", BASE_URL, device.id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        counted += body["x"]["count"].as_u64().unwrap_or(0);
    }

    assert_eq!(error_count, 0, "Too many errors: {} (expected 0)", error_count);
    assert_eq!(
        counted, sent_count as u64,
        "Analytics counted {} readings, {} were sent",
        counted, sent_count
    );
}

#[tokio::test]
#[ignore]
async fn test_concurrent_duplicate_registration() {
    let client = reqwest::Client::new();
    let name = format!("race-{}", rand::thread_rng().gen::<u32>());

    let mut handles = Vec::new();
    for _ in 0..16 {
        let client = client.clone();
        let name = name.clone();
        handles.push(tokio::spawn(async move {
            client
                .post(format!("{}/device", BASE_URL))
                .query(&[("name", name.as_str())])
                .send()
                .await
                .unwrap()
                .status()
        }));
    }

    let mut created = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            reqwest::StatusCode::OK => created += 1,
            reqwest::StatusCode::BAD_REQUEST => rejected += 1,
            other => panic!("unexpected status {}", other),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(rejected, 15);
}
