//! End-to-end runs of the pipeline against scripted pages.

use jobscout_browser::{ElementFixture, PageDriver, PageFixture, ScriptedPage};
use jobscout_core::{AppConfig, JobRecord, SearchFacet};
use jobscout_db::{count_postings, Database, JobStore};
use jobscout_scraper::site::DETAIL_LINK_SELECTOR;
use jobscout_scraper::{
    JsonFileSink, Orchestrator, Pacer, RetryPolicy, RunControl, RunStatus, ScrapeError, SkipReason,
    StoreSink,
};
use std::sync::Arc;
use tempfile::TempDir;

const ALMATY: u64 = 105_526_356;
const ASTANA: u64 = 100_184_048;

fn search_url(geo_id: u64) -> String {
    format!("https://www.linkedin.com/jobs/search/?keywords=QA+Engineer&geoId={geo_id}")
}

fn job_url(id: u32) -> String {
    format!("https://www.linkedin.com/jobs/view/{id}/")
}

fn facet(location: &str, geo_id: u64) -> SearchFacet {
    SearchFacet {
        role: "QA Engineer".to_string(),
        location: location.to_string(),
        geo_id,
        keywords: vec!["qa".to_string(), "test".to_string()],
    }
}

fn with_results(page: PageFixture, ids: &[u32]) -> PageFixture {
    ids.iter().fold(page, |page, id| {
        page.element(
            DETAIL_LINK_SELECTOR,
            ElementFixture::link(format!("/jobs/view/{id}/?trk=public_jobs"), format!("Job {id}")),
        )
    })
}

fn search_page(ids: &[u32]) -> PageFixture {
    with_results(
        PageFixture::new().element("img.global-nav__me-photo", ElementFixture::new()),
        ids,
    )
}

fn detail_page(title: &str, description: &str) -> PageFixture {
    PageFixture::new()
        .title(format!("{title} | Acme | LinkedIn"))
        .element("h1", ElementFixture::with_text(title))
        .element("div#job-details", ElementFixture::with_text(description))
}

fn qa_description(contact: &str) -> String {
    format!(
        "We need a QA engineer to own regression suites and release checks for our payments team. {contact}"
    )
}

fn orchestrator(page: &Arc<ScriptedPage>, facets: Vec<SearchFacet>) -> (Orchestrator, RunControl) {
    let driver: Arc<dyn PageDriver> = page.clone();
    let (orchestrator, control) = Orchestrator::new(driver, &AppConfig::default());
    let orchestrator = orchestrator
        .with_pacer(Pacer::disabled())
        .with_retry(RetryPolicy::immediate(3))
        .with_facets(facets);
    (orchestrator, control)
}

fn visits_to(page: &ScriptedPage, url: &str) -> usize {
    page.visits().iter().filter(|v| *v == url).count()
}

#[tokio::test]
async fn test_email_from_description_without_recruiter() {
    let description = format!(
        "{}email: hr@acme.com",
        "We build QA tooling for logistics teams and need a careful engineer. ".repeat(6)
    );
    let page = Arc::new(
        ScriptedPage::new()
            .page(search_url(ALMATY), search_page(&[1]))
            .page(job_url(1), detail_page("QA Engineer — Remote", &description)),
    );
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("output_linkedin.json");

    let (mut orchestrator, _control) = orchestrator(&page, vec![facet("Алматы", ALMATY)]);
    let mut sink = JsonFileSink::new(&output);
    let report = orchestrator.run(&mut sink).await.unwrap();

    assert_eq!(report.facets_processed, 1);
    assert_eq!(report.links_collected, 1);
    assert_eq!(report.records.len(), 1);
    let record = &report.records[0];
    assert_eq!(record.title, "QA Engineer — Remote");
    assert_eq!(record.contact_email, "hr@acme.com");
    assert_eq!(record.contact_profile_url, "");
    assert_eq!(record.location, "Алматы");

    let written: Vec<JobRecord> = serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
    assert_eq!(written, report.records);
}

#[tokio::test]
async fn test_checkpoint_redirect_skipped_without_retry() {
    let page = Arc::new(
        ScriptedPage::new()
            .page(search_url(ALMATY), search_page(&[1, 2]))
            .page(
                job_url(1),
                PageFixture::new().redirect_to("https://www.linkedin.com/checkpoint/challenge/xyz"),
            )
            .page(job_url(2), detail_page("QA Engineer", &qa_description(""))),
    );

    let (mut orchestrator, _control) = orchestrator(&page, vec![facet("Алматы", ALMATY)]);
    let dir = TempDir::new().unwrap();
    let mut sink = JsonFileSink::new(dir.path().join("out.json"));
    let report = orchestrator.run(&mut sink).await.unwrap();

    assert_eq!(report.skipped(SkipReason::Redirected), 1);
    assert_eq!(report.extraction_failures, 0);
    assert_eq!(visits_to(&page, &job_url(1)), 1);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].source_url, job_url(2));
}

#[tokio::test]
async fn test_short_description_is_incomplete() {
    let page = Arc::new(
        ScriptedPage::new()
            .page(search_url(ALMATY), search_page(&[1]))
            .page(job_url(1), detail_page("QA Engineer", "QA role, apply today, thanks!!")),
    );

    let (mut orchestrator, _control) = orchestrator(&page, vec![facet("Алматы", ALMATY)]);
    let dir = TempDir::new().unwrap();
    let mut sink = JsonFileSink::new(dir.path().join("out.json"));
    let report = orchestrator.run(&mut sink).await.unwrap();

    assert!(report.records.is_empty());
    assert_eq!(report.skipped(SkipReason::Incomplete), 1);
    assert_eq!(visits_to(&page, &job_url(1)), 1);
}

#[tokio::test]
async fn test_role_filter_and_in_run_duplicates() {
    let page = Arc::new(
        ScriptedPage::new()
            .page(search_url(ALMATY), search_page(&[1, 2, 3]))
            .page(
                job_url(1),
                detail_page("QA Engineer", &qa_description("Write to jobs@acme.com")),
            )
            .page(
                job_url(2),
                detail_page(
                    "Sous Chef",
                    "Prepare seasonal menus in a busy downtown restaurant kitchen. Write to chef@bistro.kz",
                ),
            )
            .page(
                job_url(3),
                detail_page("QA engineer", &qa_description("Write to JOBS@acme.com")),
            ),
    );

    let (mut orchestrator, _control) = orchestrator(&page, vec![facet("Алматы", ALMATY)]);
    let dir = TempDir::new().unwrap();
    let mut sink = JsonFileSink::new(dir.path().join("out.json"));
    let report = orchestrator.run(&mut sink).await.unwrap();

    assert_eq!(report.links_processed, 3);
    assert_eq!(report.role_filtered, 1);
    assert_eq!(report.duplicates, 1);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].source_url, job_url(1));
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let page = Arc::new(
        ScriptedPage::new()
            .page(search_url(ALMATY), search_page(&[1, 2]))
            .page(
                job_url(1),
                detail_page("QA Engineer", &qa_description("")).failing_first(2),
            )
            .page(
                job_url(2),
                detail_page("Senior QA Engineer", &qa_description("")).failing_first(5),
            ),
    );

    let (mut orchestrator, _control) = orchestrator(&page, vec![facet("Алматы", ALMATY)]);
    let dir = TempDir::new().unwrap();
    let mut sink = JsonFileSink::new(dir.path().join("out.json"));
    let report = orchestrator.run(&mut sink).await.unwrap();

    assert_eq!(visits_to(&page, &job_url(1)), 3);
    assert_eq!(visits_to(&page, &job_url(2)), 3);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.extraction_failures, 1);
}

#[tokio::test]
async fn test_waits_for_login_then_resumes() {
    let signed_out = with_results(
        PageFixture::new().element("button", ElementFixture::with_text("Sign in")),
        &[1],
    );
    let page = Arc::new(
        ScriptedPage::new()
            .page(search_url(ALMATY), signed_out)
            .page(job_url(1), detail_page("QA Engineer", &qa_description(""))),
    );

    let (mut orchestrator, control) = orchestrator(&page, vec![facet("Алматы", ALMATY)]);
    let mut status = control.status();
    let dir = TempDir::new().unwrap();
    let mut sink = JsonFileSink::new(dir.path().join("out.json"));

    let login = async {
        status
            .wait_for(|s| matches!(s, RunStatus::NeedsAuthentication { .. }))
            .await
            .unwrap();
        assert!(control.resume().await);
    };
    let (report, ()) = tokio::join!(orchestrator.run(&mut sink), login);
    let report = report.unwrap();

    assert_eq!(visits_to(&page, &search_url(ALMATY)), 2);
    assert_eq!(report.records.len(), 1);
    assert_eq!(*control.status().borrow(), RunStatus::Finished);
}

#[tokio::test]
async fn test_closed_resume_channel_aborts_and_finalizes() {
    let signed_out = PageFixture::new().redirect_to("https://www.linkedin.com/login?trk=guest");
    let page = Arc::new(ScriptedPage::new().page(search_url(ALMATY), signed_out));

    let (mut orchestrator, control) = orchestrator(&page, vec![facet("Алматы", ALMATY)]);
    drop(control);

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.json");
    let mut sink = JsonFileSink::new(&output);
    let result = orchestrator.run(&mut sink).await;

    assert!(matches!(result, Err(ScrapeError::ResumeChannelClosed)));
    let written: Vec<JobRecord> = serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
    assert!(written.is_empty());
}

#[tokio::test]
async fn test_failed_facet_does_not_stop_the_run() {
    let page = Arc::new(
        ScriptedPage::new()
            .page(search_url(ASTANA), search_page(&[1]))
            .page(job_url(1), detail_page("QA Engineer", &qa_description(""))),
    );

    let (mut orchestrator, _control) = orchestrator(
        &page,
        vec![facet("Алматы", ALMATY), facet("Астана", ASTANA)],
    );
    let dir = TempDir::new().unwrap();
    let mut sink = JsonFileSink::new(dir.path().join("out.json"));
    let report = orchestrator.run(&mut sink).await.unwrap();

    assert_eq!(report.facets_failed, 1);
    assert_eq!(report.facets_processed, 1);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].location, "Астана");
}

#[tokio::test]
async fn test_store_dedups_across_facets_and_runs() {
    let page = Arc::new(
        ScriptedPage::new()
            .page(search_url(ALMATY), search_page(&[1]))
            .page(search_url(ASTANA), search_page(&[1]))
            .page(
                job_url(1),
                detail_page("QA Engineer", &qa_description("Write to hr@acme.com")),
            ),
    );
    let facets = vec![facet("Алматы", ALMATY), facet("Астана", ASTANA)];

    let dir = TempDir::new().unwrap();
    let db = Database::new(dir.path().join("jobscout.db")).await.unwrap();
    db.run_migrations().await.unwrap();

    let (mut first, _control) = orchestrator(&page, facets.clone());
    let mut sink = StoreSink::new(JobStore::new(db.pool().clone(), 10));
    let report = first.run(&mut sink).await.unwrap();
    assert_eq!(report.links_collected, 2);
    assert_eq!(report.links_processed, 1);
    assert_eq!(report.store_inserted, 1);

    let (mut second, _control) = orchestrator(&page, facets);
    let mut sink = StoreSink::new(JobStore::new(db.pool().clone(), 10));
    let report = second.run(&mut sink).await.unwrap();
    assert_eq!(report.store_inserted, 0);
    assert_eq!(report.store_updated, 1);

    assert_eq!(count_postings(db.pool()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_interrupted_login_wait_still_finalizes() {
    let signed_out = with_results(
        PageFixture::new().element("button", ElementFixture::with_text("Sign in")),
        &[1],
    );
    let page = Arc::new(ScriptedPage::new().page(search_url(ALMATY), signed_out));

    let (mut orchestrator, control) = orchestrator(
        &page,
        vec![facet("Алматы", ALMATY), facet("Астана", ASTANA)],
    );
    let mut status = control.status();
    let shutdown = async move {
        status
            .wait_for(|s| matches!(s, RunStatus::NeedsAuthentication { .. }))
            .await
            .unwrap();
    };

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.json");
    let mut sink = JsonFileSink::new(&output);
    let report = orchestrator.run_until(&mut sink, shutdown).await.unwrap();

    assert!(report.interrupted);
    assert_eq!(report.facets_processed, 0);
    assert_eq!(report.facets_failed, 0);
    assert_eq!(visits_to(&page, &search_url(ASTANA)), 0);
    assert_eq!(*control.status().borrow(), RunStatus::Stopped);
    let written: Vec<JobRecord> = serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
    assert!(written.is_empty());
}

#[tokio::test]
async fn test_immediate_shutdown_writes_empty_output() {
    let page = Arc::new(ScriptedPage::new().page(search_url(ALMATY), search_page(&[1])));
    let (mut orchestrator, _control) = orchestrator(&page, vec![facet("Алматы", ALMATY)]);

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.json");
    let mut sink = JsonFileSink::new(&output);
    let report = orchestrator
        .run_until(&mut sink, std::future::ready(()))
        .await
        .unwrap();

    assert!(report.interrupted);
    assert!(page.visits().is_empty());
    assert!(output.exists());
}
