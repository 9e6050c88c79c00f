//! CLI commands

use anyhow::{Context, anyhow, bail};
use geolab_push::memory::MemoryBrowser;
use geolab_push::runtime::ReplyPort;
use geolab_push::{
    NotificationPayload, PushClient, WorkerConfig, WorkerEvent, WorkerMessage, WorkerRuntime,
};
use geolab_upload::{FileCategory, UploadPolicy, object_key};
use std::path::PathBuf;

const USAGE: &str = "usage: geolab <command>

commands:
  version                              worker version and cache name
  preview-push [payload]               notification a push with this payload renders
  simulate [payload]                   enable push, install, activate, push and click in memory
  validate <category> <mime> <path>    check a file against the upload policy

environment:
  GEOLAB_CONFIG          worker config JSON file
  GEOLAB_UPLOAD_POLICY   upload policy JSON file
  RUST_LOG               log filter (default: info)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Version,
    PreviewPush { payload: Option<String> },
    Simulate { payload: Option<String> },
    Validate {
        category: FileCategory,
        mime: String,
        path: PathBuf,
    },
    Help,
}

impl Command {
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        let Some(name) = args.first() else {
            return Ok(Self::Help);
        };

        match name.as_str() {
            "version" => Ok(Self::Version),
            "preview-push" => Ok(Self::PreviewPush {
                payload: args.get(1).cloned(),
            }),
            "simulate" => Ok(Self::Simulate {
                payload: args.get(1).cloned(),
            }),
            "validate" => {
                let [_, category, mime, path] = args else {
                    bail!("validate takes <category> <mime> <path>\n\n{}", USAGE);
                };
                let category = FileCategory::parse(category)
                    .ok_or_else(|| anyhow!("unknown category {:?} (document, video, image)", category))?;
                Ok(Self::Validate {
                    category,
                    mime: mime.clone(),
                    path: PathBuf::from(path),
                })
            }
            "help" | "-h" | "--help" => Ok(Self::Help),
            other => bail!("unknown command {:?}\n\n{}", other, USAGE),
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        match self {
            Self::Version => {
                let config = load_worker_config()?;
                println!("{} ({})", config.version, config.cache_name);
                Ok(())
            }
            Self::PreviewPush { payload } => {
                let config = load_worker_config()?;
                let notification =
                    NotificationPayload::from_push_data(payload.as_deref().map(str::as_bytes), &config.defaults);
                println!("{}", serde_json::to_string_pretty(&notification)?);
                Ok(())
            }
            Self::Simulate { payload } => simulate(load_worker_config()?, payload).await,
            Self::Validate { category, mime, path } => validate(category, &mime, &path),
            Self::Help => {
                println!("{}", USAGE);
                Ok(())
            }
        }
    }
}

fn load_worker_config() -> anyhow::Result<WorkerConfig> {
    match std::env::var_os("GEOLAB_CONFIG") {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading worker config {}", PathBuf::from(&path).display()))?;
            Ok(WorkerConfig::from_json(&json)?)
        }
        None => Ok(WorkerConfig::default()),
    }
}

fn load_upload_policy() -> anyhow::Result<UploadPolicy> {
    match std::env::var_os("GEOLAB_UPLOAD_POLICY") {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading upload policy {}", PathBuf::from(&path).display()))?;
            Ok(UploadPolicy::from_json(&json)?)
        }
        None => Ok(UploadPolicy::default()),
    }
}

/// Full lifecycle against the in-memory browser
async fn simulate(config: WorkerConfig, payload: Option<String>) -> anyhow::Result<()> {
    let browser = MemoryBrowser::new();
    browser.add_cache("geolab-previous");
    browser.add_cache(&config.cache_name);

    let client = PushClient::new(&browser, config.clone());
    let subscription = client
        .enable()
        .await
        .ok_or_else(|| anyhow!("push could not be enabled"))?;
    tracing::info!("subscription: {}", subscription.to_json());

    let runtime = WorkerRuntime::new(config.clone(), &browser);
    runtime.dispatch(WorkerEvent::Install).await;
    runtime.dispatch(WorkerEvent::Activate).await;
    tracing::info!("worker {:?}, caches {:?}", runtime.state(), browser.caches());

    let home = config.resolve_url("/").unwrap_or_else(|| config.origin.clone());
    browser.add_client(home);

    runtime
        .dispatch(WorkerEvent::Push {
            data: payload.map(String::into_bytes),
        })
        .await;
    let shown = browser
        .notifications()
        .pop()
        .ok_or_else(|| anyhow!("push produced no notification"))?;
    tracing::info!("shown: {} / {}", shown.payload.title, shown.payload.body);

    runtime
        .dispatch(WorkerEvent::NotificationClick {
            notification: shown,
            action: String::new(),
        })
        .await;
    let stats = browser.stats();
    tracing::info!("click focused {:?}, opened {:?}", stats.focused, stats.opened);

    let (port, replies) = ReplyPort::channel();
    runtime
        .dispatch(WorkerEvent::Message {
            message: WorkerMessage::GetVersion,
            reply: Some(port),
        })
        .await;
    let reply = replies.recv().await?;
    println!("{}", reply.version);
    Ok(())
}

fn validate(category: FileCategory, mime: &str, path: &std::path::Path) -> anyhow::Result<()> {
    let policy = load_upload_policy()?;
    let size = std::fs::metadata(path)
        .with_context(|| format!("reading {}", path.display()))?
        .len();
    policy.validate(category, mime, size)?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    println!("{}", object_key(chrono::Utc::now().timestamp_millis(), &filename));
    Ok(())
}
