use super::*;
use crate::core::RelayerConfig;
use crate::types::unix_now;
use crate::utils::{encode_email, encode_phone};
use alloy_primitives::Address;
use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::Client;
use serde_json::{json, Value};

const SECRET: &str = "test";

fn contract() -> Address {
    Address::repeat_byte(0xC0)
}

fn acme() -> Address {
    Address::repeat_byte(0xAC)
}

fn alice() -> Address {
    Address::repeat_byte(0xA1)
}

fn bob() -> Address {
    Address::repeat_byte(0xB0)
}

fn token(address: Address) -> String {
    AuthConfig::new(SECRET).issue_token(address).unwrap()
}

async fn client() -> Client {
    let store = Database::in_memory().await.unwrap();
    let run = EventRepository::new(store.pool())
        .start_run(&contract().to_string())
        .await
        .unwrap();
    let coprocessor = Arc::new(MockCoprocessor::new());
    let ledger = Ledger::new(coprocessor.clone(), contract());
    let relayer = RelayerConfig {
        url: None,
        timeout_seconds: 5,
        attempts: 1,
    };
    let state = AppState::new(ledger, coprocessor, store, run.id, relayer);

    let rocket = build_rocket(rocket::build(), state, AuthConfig::new(SECRET));
    Client::tracked(rocket).await.unwrap()
}

async fn post(client: &Client, path: &str, caller: Option<Address>, body: Value) -> (Status, Value) {
    let mut request = client
        .post(path)
        .header(ContentType::JSON)
        .body(body.to_string());
    if let Some(address) = caller {
        request = request.header(Header::new(
            "Authorization",
            format!("Bearer {}", token(address)),
        ));
    }
    let response = request.dispatch().await;
    let status = response.status();
    (status, response.into_json::<Value>().await.unwrap_or(Value::Null))
}

async fn get(client: &Client, path: &str, caller: Option<Address>) -> (Status, Value) {
    let mut request = client.get(path);
    if let Some(address) = caller {
        request = request.header(Header::new(
            "Authorization",
            format!("Bearer {}", token(address)),
        ));
    }
    let response = request.dispatch().await;
    let status = response.status();
    (status, response.into_json::<Value>().await.unwrap_or(Value::Null))
}

/// Returns (handles, attestation) for the given clear values.
async fn encrypt(client: &Client, caller: Address, values: Value) -> (Vec<Value>, Value) {
    let (status, body) = post(client, "/api/dev/encrypt", Some(caller), json!({ "values": values })).await;
    assert_eq!(status, Status::Ok, "{}", body);
    let data = &body["data"];
    (
        data["handles"].as_array().unwrap().clone(),
        data["attestation"].clone(),
    )
}

async fn register_acme(client: &Client) {
    let (status, body) = post(
        client,
        "/api/companies/register",
        Some(acme()),
        json!({
            "name": "Acme",
            "industry": "Software",
            "website": "https://acme.example",
            "contact_email": "jobs@acme.example",
            "location": "Paris"
        }),
    )
    .await;
    assert_eq!(status, Status::Ok, "{}", body);
}

async fn post_job(client: &Client, max_salary: u32) -> u64 {
    let (handles, attestation) = encrypt(
        client,
        acme(),
        json!([
            { "type": "u32", "value": max_salary },
            { "type": "u32", "value": 3 },
            { "type": "u32", "value": 1 },
            { "type": "u32", "value": 0 }
        ]),
    )
    .await;

    let (status, body) = post(
        client,
        "/api/jobs",
        Some(acme()),
        json!({
            "title": "Rust Engineer",
            "location": "Paris",
            "work_preference": "Hybrid",
            "primary_field": "Software",
            "max_salary": handles[0],
            "min_experience": handles[1],
            "min_education": handles[2],
            "preferred_sex": handles[3],
            "attestation": attestation,
            "application_deadline": unix_now() + 86_400,
            "vacancy_count": 2,
            "conversation_id": "conv-1"
        }),
    )
    .await;
    assert_eq!(status, Status::Ok, "{}", body);
    assert_eq!(body["conversation_id"], "conv-1");
    body["data"]["job_id"].as_u64().unwrap()
}

async fn register_alice(client: &Client) {
    let (handles, attestation) = encrypt(
        client,
        alice(),
        json!([
            { "type": "u32", "value": 120_000 },
            { "type": "u32", "value": 5 },
            { "type": "u32", "value": 1 },
            { "type": "u32", "value": 0 },
            { "type": "u256", "value": encode_email("alice@example.com").unwrap() },
            { "type": "u32", "value": encode_phone("+33 6 12 34 56 78").unwrap() }
        ]),
    )
    .await;

    let (status, body) = post(
        client,
        "/api/individuals/register",
        Some(alice()),
        json!({
            "expected_salary": handles[0],
            "experience": handles[1],
            "education": handles[2],
            "sex": handles[3],
            "contact_email": handles[4],
            "contact_phone": handles[5],
            "attestation": attestation
        }),
    )
    .await;
    assert_eq!(status, Status::Ok, "{}", body);
}

#[rocket::async_test]
async fn test_health() {
    let client = client().await;
    let (status, body) = get(&client, "/api/health", None).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["success"], true);
}

#[rocket::async_test]
async fn test_mutation_requires_token() {
    let client = client().await;
    let (status, body) = post(&client, "/api/jobs/0/apply", None, json!({})).await;
    assert_eq!(status, Status::Unauthorized);
    assert_eq!(body["error_code"], "UNAUTHORIZED");

    let response = client
        .post("/api/jobs/0/apply")
        .header(Header::new("Authorization", "Bearer not-a-jwt"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
}

#[rocket::async_test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let client = client().await;
    let forged = AuthConfig::new("other").issue_token(alice()).unwrap();
    let response = client
        .get("/api/me/roles")
        .header(Header::new("Authorization", format!("Bearer {}", forged)))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
}

#[rocket::async_test]
async fn test_errors_carry_ledger_codes() {
    let client = client().await;

    let (status, body) = get(&client, "/api/jobs/7", None).await;
    assert_eq!(status, Status::NotFound);
    assert_eq!(body["error_code"], "JOB_NOT_FOUND");

    let (status, body) = post(&client, "/api/jobs/7/apply", Some(alice()), json!({})).await;
    assert_eq!(status, Status::NotFound);
    assert_eq!(body["error_code"], "JOB_NOT_FOUND");

    let (status, body) = get(&client, &format!("/api/companies/{}", acme()), None).await;
    assert_eq!(status, Status::NotFound);
    assert_eq!(body["error_code"], "COMPANY_NOT_FOUND");

    let (status, body) = get(&client, "/api/individuals/not-an-address", None).await;
    assert_eq!(status, Status::BadRequest);
    assert_eq!(body["error_code"], "INVALID_ADDRESS");

    let (status, body) = post(&client, "/api/dev/encrypt", Some(alice()), json!({ "values": [] })).await;
    assert_eq!(status, Status::UnprocessableEntity);
    assert_eq!(body["error_code"], "EMPTY_INPUT");
}

#[rocket::async_test]
async fn test_input_encrypted_for_other_sender_is_rejected() {
    let client = client().await;
    register_acme(&client).await;

    // Alice's attested input replayed by acme.
    let (handles, attestation) = encrypt(
        &client,
        alice(),
        json!([
            { "type": "u32", "value": 1 },
            { "type": "u32", "value": 1 },
            { "type": "u32", "value": 1 },
            { "type": "u32", "value": 1 }
        ]),
    )
    .await;
    let (status, body) = post(
        &client,
        "/api/jobs",
        Some(acme()),
        json!({
            "title": "Replay",
            "location": "Paris",
            "work_preference": "Remote",
            "primary_field": "AI",
            "max_salary": handles[0],
            "min_experience": handles[1],
            "min_education": handles[2],
            "preferred_sex": handles[3],
            "attestation": attestation,
            "application_deadline": unix_now() + 86_400,
            "vacancy_count": 1
        }),
    )
    .await;
    assert_eq!(status, Status::UnprocessableEntity);
    assert_eq!(body["error_code"], "INVALID_CIPHERTEXT");

    let (_, body) = get(&client, "/api/next-job-id", None).await;
    assert_eq!(body["data"], 0);
}

#[rocket::async_test]
async fn test_full_matching_flow() {
    let client = client().await;
    register_acme(&client).await;
    let job_id = post_job(&client, 150_000).await;
    assert_eq!(job_id, 0);
    register_alice(&client).await;

    let (status, _) = post(&client, "/api/jobs/0/apply", Some(alice()), json!({})).await;
    assert_eq!(status, Status::Ok);
    let (status, body) = post(&client, "/api/jobs/0/apply", Some(alice()), json!({})).await;
    assert_eq!(status, Status::Conflict);
    assert_eq!(body["error_code"], "ALREADY_APPLIED");

    let (_, body) = get(&client, "/api/jobs?title=rust", Some(alice())).await;
    let listings = body["data"].as_array().unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0]["viewer_state"], "applied");

    // Only the owner may evaluate.
    let (status, body) = post(
        &client,
        "/api/jobs/0/evaluate",
        Some(bob()),
        json!({ "applicants": [alice()] }),
    )
    .await;
    assert_eq!(status, Status::Forbidden);
    assert_eq!(body["error_code"], "NOT_JOB_OWNER");

    let (status, body) = post(
        &client,
        "/api/jobs/0/evaluate",
        Some(acme()),
        json!({ "applicants": [alice(), bob()] }),
    )
    .await;
    assert_eq!(status, Status::Ok, "{}", body);
    assert_eq!(body["data"]["evaluated"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["skipped"].as_array().unwrap().len(), 1);

    // Evaluated jobs leave the market.
    let (_, body) = get(&client, "/api/jobs", None).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let path = format!("/api/jobs/0/applications/{}", alice());
    let (status, body) = get(&client, &path, None).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["data"]["state"], "evaluated");
    let eligible = body["data"]["application"]["eligible"].clone();
    let phone = body["data"]["application"]["contact_phone"].clone();

    let (status, body) = post(&client, "/api/decrypt", Some(alice()), json!({ "handle": eligible })).await;
    assert_eq!(status, Status::Ok, "{}", body);
    assert_eq!(body["data"]["value"], json!({ "type": "bool", "value": true }));

    let (status, body) = post(&client, "/api/decrypt", Some(acme()), json!({ "handle": phone })).await;
    assert_eq!(status, Status::Ok, "{}", body);
    assert_eq!(body["data"]["value"], json!({ "type": "u32", "value": 3_612_345_678u32 }));

    let (status, body) = post(&client, "/api/decrypt", Some(bob()), json!({ "handle": eligible })).await;
    assert_eq!(status, Status::Forbidden);
    assert_eq!(body["error_code"], "NOT_AUTHORIZED");

    let (_, body) = get(&client, "/api/jobs/0/stats", None).await;
    assert_eq!(body["data"]["applicants"], 1);
    assert_eq!(body["data"]["evaluated"], 1);
    assert_eq!(body["data"]["evaluation_started"], true);
    assert_eq!(body["data"]["indexed_applicants"], 1);

    let (_, body) = get(&client, "/api/me/roles", Some(acme())).await;
    assert_eq!(body["data"]["default_role"], "Company");

    let (_, body) = get(&client, "/api/me/applications", Some(alice())).await;
    assert_eq!(body["data"][0]["state"], "evaluated");
}

#[rocket::async_test]
async fn test_ineligible_applicant_contacts_stay_hidden() {
    let client = client().await;
    register_acme(&client).await;
    post_job(&client, 100_000).await;
    register_alice(&client).await;
    post(&client, "/api/jobs/0/apply", Some(alice()), json!({})).await;
    post(
        &client,
        "/api/jobs/0/evaluate",
        Some(acme()),
        json!({ "applicants": [alice()] }),
    )
    .await;

    let path = format!("/api/jobs/0/applications/{}", alice());
    let (_, body) = get(&client, &path, None).await;
    let eligible = body["data"]["application"]["eligible"].clone();
    let email = body["data"]["application"]["contact_email"].clone();

    let (_, body) = post(&client, "/api/decrypt", Some(acme()), json!({ "handle": eligible })).await;
    assert_eq!(body["data"]["value"], json!({ "type": "bool", "value": false }));

    let (status, body) = post(&client, "/api/decrypt", Some(acme()), json!({ "handle": email })).await;
    assert_eq!(status, Status::Forbidden);
    assert_eq!(body["error_code"], "NOT_AUTHORIZED");
}

#[rocket::async_test]
async fn test_owner_lists_applicants_then_evaluates_them() {
    let client = client().await;
    register_acme(&client).await;
    let job_id = post_job(&client, 150_000).await;
    register_alice(&client).await;
    post(&client, &format!("/api/jobs/{}/apply", job_id), Some(alice()), json!({})).await;

    let applicants_path = format!("/api/jobs/{}/applicants", job_id);
    let (status, body) = get(&client, &applicants_path, Some(bob())).await;
    assert_eq!(status, Status::Forbidden);
    assert_eq!(body["error_code"], "NOT_JOB_OWNER");

    let (status, body) = get(&client, &applicants_path, Some(acme())).await;
    assert_eq!(status, Status::Ok, "{}", body);
    let listed = body["data"].as_array().unwrap().clone();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["state"], "applied");
    let applicants: Vec<Value> = listed.iter().map(|a| a["applicant"].clone()).collect();

    let (status, body) = post(
        &client,
        &format!("/api/jobs/{}/evaluate", job_id),
        Some(acme()),
        json!({ "applicants": applicants }),
    )
    .await;
    assert_eq!(status, Status::Ok, "{}", body);
    assert_eq!(body["data"]["evaluated"].as_array().unwrap().len(), 1);

    let (_, body) = get(&client, &applicants_path, Some(acme())).await;
    assert_eq!(body["data"][0]["state"], "evaluated");

    // Each listed applicant reads back their own eligibility.
    for value in &applicants {
        let applicant: Address = serde_json::from_value(value.clone()).unwrap();
        let path = format!("/api/jobs/{}/applications/{}", job_id, applicant);
        let (_, body) = get(&client, &path, None).await;
        let eligible = body["data"]["application"]["eligible"].clone();

        let (status, body) =
            post(&client, "/api/decrypt", Some(applicant), json!({ "handle": eligible })).await;
        assert_eq!(status, Status::Ok, "{}", body);
        assert_eq!(body["data"]["value"], json!({ "type": "bool", "value": true }));
    }

    let (status, body) = get(&client, "/api/me/jobs", Some(acme())).await;
    assert_eq!(status, Status::Ok);
    let jobs = body["data"].as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["job_id"], job_id);
    assert_eq!(jobs[0]["applicant_count"], 1);
    assert_eq!(jobs[0]["evaluated_count"], 1);
    assert_eq!(jobs[0]["evaluation_started"], true);

    let (_, body) = get(&client, "/api/me/jobs", Some(bob())).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[rocket::async_test]
async fn test_individual_update_replaces_profile() {
    let client = client().await;
    register_alice(&client).await;
    let profile_path = format!("/api/individuals/{}", alice());
    let (_, before) = get(&client, &profile_path, None).await;

    // Email encrypted with the wrong width is rejected as a whole.
    let (handles, attestation) = encrypt(
        &client,
        alice(),
        json!([
            { "type": "u32", "value": 90_000 },
            { "type": "u32", "value": 6 },
            { "type": "u32", "value": 2 },
            { "type": "u32", "value": 0 },
            { "type": "u32", "value": 7 },
            { "type": "u32", "value": 612_345_678 }
        ]),
    )
    .await;
    let (status, body) = post(
        &client,
        "/api/individuals/update",
        Some(alice()),
        json!({
            "expected_salary": handles[0],
            "experience": handles[1],
            "education": handles[2],
            "sex": handles[3],
            "contact_email": handles[4],
            "contact_phone": handles[5],
            "attestation": attestation
        }),
    )
    .await;
    assert_eq!(status, Status::UnprocessableEntity);
    assert_eq!(body["error_code"], "INVALID_CIPHERTEXT");
    let (_, unchanged) = get(&client, &profile_path, None).await;
    assert_eq!(unchanged["data"], before["data"]);

    let (handles, attestation) = encrypt(
        &client,
        alice(),
        json!([
            { "type": "u32", "value": 90_000 },
            { "type": "u32", "value": 6 },
            { "type": "u32", "value": 2 },
            { "type": "u32", "value": 0 },
            { "type": "u256", "value": encode_email("alice@new.example").unwrap() },
            { "type": "u32", "value": 612_345_678 }
        ]),
    )
    .await;
    let (status, body) = post(
        &client,
        "/api/individuals/update",
        Some(alice()),
        json!({
            "expected_salary": handles[0],
            "experience": handles[1],
            "education": handles[2],
            "sex": handles[3],
            "contact_email": handles[4],
            "contact_phone": handles[5],
            "attestation": attestation
        }),
    )
    .await;
    assert_eq!(status, Status::Ok, "{}", body);

    let (_, after) = get(&client, &profile_path, None).await;
    let profile = &after["data"]["profile"];
    assert_eq!(profile["version"], 2);
    assert_eq!(profile["contact_email"], handles[4]);
    assert_ne!(profile["expected_salary"], before["data"]["profile"]["expected_salary"]);
}

#[rocket::async_test]
async fn test_company_update_replaces_details() {
    let client = client().await;

    let update = json!({
        "name": "Acme Labs",
        "industry": "Research",
        "website": "https://labs.acme.example",
        "contact_email": "talent@acme.example",
        "location": "Lyon"
    });
    let (status, body) = post(&client, "/api/companies/update", Some(acme()), update.clone()).await;
    assert_eq!(status, Status::NotFound);
    assert_eq!(body["error_code"], "COMPANY_NOT_FOUND");

    register_acme(&client).await;
    let (status, body) = post(&client, "/api/companies/update", Some(acme()), update).await;
    assert_eq!(status, Status::Ok, "{}", body);

    let (_, body) = get(&client, &format!("/api/companies/{}", acme()), None).await;
    assert_eq!(body["data"]["name"], "Acme Labs");
    assert_eq!(body["data"]["location"], "Lyon");

    let (_, body) = get(&client, "/api/companies", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}
