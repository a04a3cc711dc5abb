use anyhow::Result;
use async_trait::async_trait;
use chemnames::{
    process::{Attempt, Record, RetryPolicy},
    run, Enricher, InputError, KeyColumn, Lookup, PipelineError, SENTINEL,
};
use std::{
    collections::HashMap,
    fs,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc, Mutex,
    },
};
use tempfile::tempdir;

const ASPIRIN_SMILES: &str = "CC(=O)OC1=CC=CC=C1C(=O)O";
const ASPIRIN_INCHI: &str = "InChI=1S/C9H8O4/c1-6(10)13-8-5-3-2-4-7(8)9(11)12/h2-5H,1H3,(H,11,12)";

/// Deterministic stand-in for PubChem name search. Keys listed in `busy`
/// answer `Retryable` that many times before their real answer.
struct StubPubChem {
    found: HashMap<String, Record>,
    busy: Mutex<HashMap<String, u32>>,
    calls: Mutex<HashMap<String, u32>>,
    total: AtomicU32,
}

impl StubPubChem {
    fn new() -> Self {
        let aspirin = Record::new()
            .with("SMILES", ASPIRIN_SMILES)
            .with("InChI", ASPIRIN_INCHI)
            .with("Full Name", "Aspirin");
        Self {
            found: HashMap::from([("Aspirin".to_string(), aspirin)]),
            busy: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            total: AtomicU32::new(0),
        }
    }

    fn busy_for(self, key: &str, times: u32) -> Self {
        self.busy.lock().unwrap().insert(key.to_string(), times);
        self
    }

    fn calls(&self, key: &str) -> u32 {
        self.calls.lock().unwrap().get(key).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Lookup for StubPubChem {
    fn columns(&self) -> &[&'static str] {
        &["SMILES", "InChI", "Full Name"]
    }

    fn key_column(&self) -> &str {
        "Compound"
    }

    async fn lookup(&self, key: &str) -> Attempt {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.calls.lock().unwrap().entry(key.to_string()).or_default() += 1;

        if let Some(left) = self.busy.lock().unwrap().get_mut(key) {
            if *left > 0 {
                *left -= 1;
                return Attempt::Retryable("PUGREST.ServerBusy".into());
            }
        }
        match self.found.get(key) {
            Some(record) => Attempt::Found(record.clone()),
            None => Attempt::NotFound,
        }
    }
}

fn enricher(stub: Arc<StubPubChem>) -> Enricher {
    Enricher::new(stub)
        .with_policy(RetryPolicy::immediate(5))
        .with_workers(5)
}

#[tokio::test]
async fn test_example_scenario() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("in.csv");
    let output = dir.path().join("out.csv");
    fs::write(&input, "Compound\nAspirin\nxxxxxx\nUnknownXYZ123\n")?;

    let stub = Arc::new(StubPubChem::new());
    let summary = run(&input, &output, &KeyColumn::named("Compound"), &enricher(stub.clone())).await?;

    let expected = format!(
        "Compound,SMILES,InChI,Full Name\n\
         Aspirin,{ASPIRIN_SMILES},\"{ASPIRIN_INCHI}\",Aspirin\n\
         xxxxxx,xxxxxx,xxxxxx,xxxxxx\n\
         UnknownXYZ123,xxxxxx,xxxxxx,xxxxxx\n"
    );
    assert_eq!(fs::read_to_string(&output)?, expected);
    assert_eq!(summary.total(), 3);
    assert_eq!(summary.found, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.not_found, 1);
    // the sentinel row never reached the collaborator
    assert_eq!(stub.calls(SENTINEL), 0);
    assert_eq!(stub.total.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn test_transient_failures_are_retried() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("in.csv");
    let output = dir.path().join("out.csv");
    fs::write(&input, "Compound,Batch\nAspirin,7\n")?;

    let stub = Arc::new(StubPubChem::new().busy_for("Aspirin", 3));
    run(&input, &output, &KeyColumn::named("Compound"), &enricher(stub.clone())).await?;

    let text = fs::read_to_string(&output)?;
    assert!(text.starts_with("Compound,Batch,SMILES,InChI,Full Name\nAspirin,7,"));
    assert!(text.contains(ASPIRIN_SMILES));
    assert_eq!(stub.calls("Aspirin"), 4);
    Ok(())
}

#[tokio::test]
async fn test_always_busy_gives_sentinel_after_five_calls() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("in.csv");
    let output = dir.path().join("out.csv");
    fs::write(&input, "Compound\nAspirin\n")?;

    let stub = Arc::new(StubPubChem::new().busy_for("Aspirin", u32::MAX));
    run(&input, &output, &KeyColumn::named("Compound"), &enricher(stub.clone())).await?;

    assert_eq!(
        fs::read_to_string(&output)?,
        "Compound,SMILES,InChI,Full Name\nAspirin,xxxxxx,xxxxxx,xxxxxx\n"
    );
    assert_eq!(stub.calls("Aspirin"), 5);
    Ok(())
}

#[tokio::test]
async fn test_runs_are_byte_identical() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("in.csv");
    let mut content = String::from("Compound,Lab\n");
    for i in 0..40 {
        let name = if i % 3 == 0 { "Aspirin".to_string() } else { format!("Unknown{i}") };
        content.push_str(&format!("{name},lab-{i}\n"));
    }
    fs::write(&input, &content)?;

    let first = dir.path().join("first.csv");
    let second = dir.path().join("second.csv");
    let key = KeyColumn::named("Compound");
    run(&input, &first, &key, &enricher(Arc::new(StubPubChem::new()))).await?;
    run(&input, &second, &key, &enricher(Arc::new(StubPubChem::new()))).await?;

    let first = fs::read(&first)?;
    assert_eq!(first, fs::read(&second)?);
    // header plus one line per input row
    assert_eq!(first.iter().filter(|&&b| b == b'\n').count(), 41);
    Ok(())
}

#[tokio::test]
async fn test_missing_column_writes_nothing() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("in.csv");
    let output = dir.path().join("out.csv");
    fs::write(&input, "Name\nAspirin\n")?;

    let stub = Arc::new(StubPubChem::new());
    let err = run(&input, &output, &KeyColumn::named("Compound"), &enricher(stub.clone()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Input(InputError::MissingColumn { .. })
    ));
    assert!(!output.exists());
    assert_eq!(stub.total.load(Ordering::SeqCst), 0);
    Ok(())
}
