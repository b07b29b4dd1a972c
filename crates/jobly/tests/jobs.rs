mod common;

use common::TestDb;
use jobly::{
    Caller, GenericClient, Handlers, Job, JobFilter, JobUpdate, JoblyError, JoblyResult, NewJob,
    TracingClient,
};
use rust_decimal::Decimal;
use serde_json::json;

fn titles(jobs: &[Job]) -> Vec<&str> {
    jobs.iter().map(|j| j.title.as_str()).collect()
}

async fn insert_j4(client: &impl GenericClient) -> JoblyResult<()> {
    client
        .batch_execute(
            "INSERT INTO jobs (title, salary, equity, company_handle) VALUES ('j4', 125000, NULL, 'c1')",
        )
        .await
}

#[tokio::test]
async fn create_assigns_id_and_rejects_duplicates() -> JoblyResult<()> {
    let Some(db) = TestDb::connect("create_assigns_id_and_rejects_duplicates").await? else {
        return Ok(());
    };

    let new = NewJob::from_json(&json!({
        "title": "coder",
        "salary": 75000,
        "equity": "0.5",
        "companyHandle": "c1",
    }))?;
    let job = Job::create(&db.client, &new).await?;
    assert!(job.id > 0);
    assert_eq!(job.equity, Some(Decimal::new(5, 1)));
    assert_eq!(job.company_handle, "c1");

    let err = Job::create(&db.client, &new).await.unwrap_err();
    assert!(err.is_conflict());

    let orphan = NewJob {
        title: "orphan".into(),
        salary: None,
        equity: None,
        company_handle: "nope".into(),
    };
    let err = Job::create(&db.client, &orphan).await.unwrap_err();
    assert!(matches!(err, JoblyError::ForeignKeyViolation(_)));
    assert_eq!(err.status_code(), 400);

    db.teardown().await
}

#[tokio::test]
async fn find_all_filters() -> JoblyResult<()> {
    let Some(db) = TestDb::connect("find_all_filters").await? else {
        return Ok(());
    };
    insert_j4(&db.client).await?;

    let all = Job::find_all(&db.client, None).await?;
    assert_eq!(titles(&all), ["j1", "j2", "j3", "j4"]);

    let filter = JobFilter::from_json(&json!({"minSalary": 90000, "hasEquity": true}))?;
    let rich = Job::find_all(&db.client, Some(&filter)).await?;
    assert_eq!(titles(&rich), ["j2", "j3"]);

    // nothing survives, so the unfiltered query runs
    let filter = JobFilter::from_json(&json!({"hasEquity": false}))?;
    let everything = Job::find_all(&db.client, Some(&filter)).await?;
    assert_eq!(titles(&everything), ["j1", "j2", "j3", "j4"]);

    let filter = JobFilter::new().title("J").min_salary(100000);
    assert_eq!(
        titles(&Job::find_all(&db.client, Some(&filter)).await?),
        ["j3", "j4"]
    );

    db.teardown().await
}

#[tokio::test]
async fn get_update_remove() -> JoblyResult<()> {
    let Some(db) = TestDb::connect("get_update_remove").await? else {
        return Ok(());
    };

    let j1 = Job::get(&db.client, "j1").await?;
    assert_eq!(j1.salary, Some(75000));
    assert!(Job::get(&db.client, "nope").await.unwrap_err().is_not_found());

    let partial = JobUpdate {
        salary: Some(300000),
        ..JobUpdate::default()
    };
    let updated = Job::update(&db.client, "j1", &partial).await?;
    assert_eq!(updated.id, j1.id);
    assert_eq!(updated.salary, Some(300000));
    assert_eq!(updated.title, "j1");
    assert_eq!(updated.equity, j1.equity);

    let full = JobUpdate::from_json(&json!({"title": "newTitle", "salary": 1, "equity": 1}))?;
    let updated = Job::update(&db.client, "j1", &full).await?;
    assert_eq!(updated.title, "newTitle");
    assert_eq!(updated.equity, Some(Decimal::ONE));

    assert!(Job::update(&db.client, "nope", &partial).await.unwrap_err().is_not_found());
    assert!(
        Job::update(&db.client, "newTitle", &JobUpdate::default())
            .await
            .unwrap_err()
            .is_bad_request()
    );

    assert_eq!(Job::remove(&db.client, "newTitle").await?, "newTitle");
    assert!(Job::remove(&db.client, "newTitle").await.unwrap_err().is_not_found());

    db.teardown().await
}

#[tokio::test]
async fn rename_onto_taken_title_is_a_conflict() -> JoblyResult<()> {
    let Some(db) = TestDb::connect("rename_onto_taken_title_is_a_conflict").await? else {
        return Ok(());
    };

    let rename = JobUpdate::from_json(&json!({"title": "j2"}))?;
    let err = Job::update(&db.client, "j1", &rename).await.unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(err.status_code(), 400);
    assert_eq!(err.message(), "Duplicate job: j2");

    let rows = db
        .client
        .query("SELECT id FROM jobs WHERE title = 'j2'", &[])
        .await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(Job::get(&db.client, "j1").await?.title, "j1");

    // keeping the current title is not a rename
    let same = JobUpdate::from_json(&json!({"title": "j1", "salary": 1}))?;
    assert_eq!(Job::update(&db.client, "j1", &same).await?.salary, Some(1));

    assert_eq!(Job::remove(&db.client, "j2").await?, "j2");
    assert_eq!(Job::find_all(&db.client, None).await?.len(), 2);

    db.teardown().await
}

#[tokio::test]
async fn handlers_through_tracing_client() -> JoblyResult<()> {
    let Some(db) = TestDb::connect("handlers_through_tracing_client").await? else {
        return Ok(());
    };
    let h = Handlers::new(TracingClient::new(&db.client));
    let admin = Caller::admin("admin");

    let r = h
        .create_job(
            &admin,
            &json!({"title": "new", "salary": 10, "equity": "0.2", "companyHandle": "c1"}),
        )
        .await;
    assert_eq!(r.status, 201);
    assert_eq!(r.body["job"]["equity"], "0.2");

    let r = h
        .list_jobs(&[
            ("minSalary".to_string(), "90000".to_string()),
            ("hasEquity".to_string(), "true".to_string()),
        ])
        .await;
    assert_eq!(r.status, 200);
    assert_eq!(r.body["jobs"].as_array().map(Vec::len), Some(2));

    let r = h
        .update_job(&admin, "j1", &json!({"title": "j1-new"}))
        .await;
    assert_eq!(r.body["job"]["title"], "j1-new");

    let r = h.update_job(&Caller::user("u1"), "j1-new", &json!({"title": "x"})).await;
    assert_eq!(r.status, 401);

    let r = h.delete_job(&admin, "j1-new").await;
    assert_eq!(r.body, json!({"deleted": "j1-new"}));

    let r = h.get_job("j1-new").await;
    assert_eq!(r.status, 404);

    drop(h);
    db.teardown().await
}
