//! `weave link`: the auto-linking pass

use crate::cli::LinkArgs;
use crate::output::render_report;
use crate::prompt::resolve_pending;
use crate::writer::write_documents;
use anyhow::{bail, Result};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use weaver_config::Config;
use weaver_core::{
    Corpus, Engine, EngineError, EngineOptions, ResolveMode, RuleTable, RunReport,
};

/// Apply command-line overrides on top of the loaded configuration
fn apply_overrides(config: &mut Config, args: &LinkArgs) -> Result<()> {
    let linking = &mut config.linking;
    if args.exclude_tables {
        linking.exclude_tables = true;
    }
    if let Some(max) = args.max_links {
        linking.max_links_per_document = max;
    }
    if let Some(confidence) = args.confidence {
        linking.confidence_threshold = confidence;
    }
    if let Some(margin) = args.margin {
        linking.ambiguity_margin = margin;
    }
    if args.no_variants {
        config.variants.enabled = false;
    }
    if args.no_backup {
        config.vault.backup = false;
    }
    config.validate()?;
    Ok(())
}

/// Map `--target` values (id, file stem, or vault-relative path) to document ids
pub fn resolve_targets(corpus: &Corpus, root: &Path, targets: &[String]) -> Result<BTreeSet<String>> {
    let mut ids = BTreeSet::new();
    for wanted in targets {
        let wanted_path = Path::new(wanted);
        let found = corpus.iter().find(|doc| {
            let relative = doc.path().strip_prefix(root).unwrap_or(doc.path());
            doc.id == *wanted
                || doc.path().file_stem().is_some_and(|s| s == wanted.as_str())
                || relative == wanted_path
                || relative.with_extension("") == wanted_path
        });
        match found {
            Some(doc) => {
                ids.insert(doc.id.clone());
            }
            None => bail!("--target {wanted}: no such note in the vault"),
        }
    }
    Ok(ids)
}

/// Run the linking pass. Returns false when any file could not be written.
pub async fn execute(args: LinkArgs, mut config: Config) -> Result<bool> {
    apply_overrides(&mut config, &args)?;
    let root = args.vault.path.clone();

    let (corpus, load_errors) = super::load_vault(&args.vault, &config)?;

    let rules = if config.variants.enabled {
        RuleTable::new(&config.load_rules(&root)?, config.variants.max_variants)
    } else {
        RuleTable::empty()
    };

    let refiner = match weaver_llm::create_refiner(&config.similarity) {
        Ok(refiner) => refiner,
        Err(err) => {
            warn!(error = %err, "similarity backend unavailable; using rule confidences");
            None
        }
    };

    let targets = if args.target.is_empty() {
        None
    } else {
        Some(resolve_targets(&corpus, &root, &args.target)?)
    };

    let options = EngineOptions {
        linking: config.linking.clone(),
        variants_enabled: config.variants.enabled,
        mode: if args.interactive {
            ResolveMode::Interactive
        } else {
            ResolveMode::Automatic
        },
        targets,
    };
    let engine = Engine::new(corpus, &rules, options, refiner)?;

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted; finishing the current note");
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    let mut analysis = match engine.analyze(&cancel).await {
        Ok(analysis) => analysis,
        Err(EngineError::Cancelled) => bail!("cancelled; no files written"),
        Err(err) => return Err(err.into()),
    };

    if args.interactive {
        let linked = resolve_pending(&engine, &mut analysis);
        info!(linked, "interactive choices applied");
    }

    let plan = engine.plan(&analysis);
    let mut report = RunReport::build(&engine, &analysis, &plan, !args.execute).with_load_errors(load_errors);

    if args.execute {
        if cancel.load(Ordering::Relaxed) {
            bail!("cancelled; no files written");
        }
        let outcome = engine.commit(&plan);
        for (id, err) in &outcome.failures {
            report.record_write_error(id.clone(), err.to_string());
        }
        for (id, err) in write_documents(&outcome.updated, config.vault.backup) {
            report.record_write_error(id, format!("{err:#}"));
        }
        info!(
            updated = outcome.updated.len(),
            failed = report.write_errors.len(),
            "write pass complete"
        );
    }

    render_report(&report, &root, args.format)?;
    Ok(report.write_errors.is_empty())
}
