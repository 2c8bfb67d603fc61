use anyhow::{Context, Result, bail};
use marginalia_config::Config;
use marginalia_engine::{
    CharGridGeometry, CommentLayer, Document, ObserverConfig, SavedComment, Selection,
    SelectionObserver, SelectionOutcome, TimerQueue,
};
use std::{env, fs, path::PathBuf, process};

/// A selection given on the command line as `id:start-end`, offsets measured
/// in characters within the identified element's text.
struct SelectionSpec {
    id: String,
    start: usize,
    end: usize,
}

fn parse_selection(raw: &str) -> Result<SelectionSpec> {
    let (id, offsets) = raw
        .rsplit_once(':')
        .context("selection must look like id:start-end")?;
    let (start, end) = offsets
        .split_once('-')
        .context("selection must look like id:start-end")?;
    let spec = SelectionSpec {
        id: id.to_string(),
        start: start.parse().context("selection start is not a number")?,
        end: end.parse().context("selection end is not a number")?,
    };
    if spec.id.is_empty() {
        bail!("selection id must not be empty");
    }
    if spec.end < spec.start {
        bail!("selection end precedes start");
    }
    Ok(spec)
}

fn run(document_path: &str, comments_path: Option<&str>, selection: Option<SelectionSpec>) -> Result<()> {
    let config = match Config::load() {
        Ok(Some(config)) => config,
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let source = fs::read_to_string(document_path)
        .with_context(|| format!("reading document '{document_path}'"))?;
    let mut doc = Document::parse_xhtml(&source)
        .with_context(|| format!("parsing document '{document_path}'"))?;

    let geometry = CharGridGeometry::new(80);

    let mut layer = None;
    if let Some(path) = comments_path {
        let json = fs::read_to_string(path).with_context(|| format!("reading comments '{path}'"))?;
        let comments: Vec<SavedComment> =
            serde_json::from_str(&json).with_context(|| format!("parsing comments '{path}'"))?;
        let materialized = CommentLayer::materialize(&mut doc, comments, &geometry);
        log::info!("materialized {} comment(s)", materialized.len());
        for (index, entry) in materialized.entries().iter().enumerate() {
            if let Some(callout) = materialized.callout_position(index) {
                log::info!(
                    "comment {} callout at ({:.0}, {:.0})",
                    entry.comment().id,
                    callout.x,
                    callout.y
                );
            }
        }
        layer = Some(materialized);
    }

    if let Some(spec) = selection {
        let root = doc
            .element_by_id("article")
            .unwrap_or_else(|| doc.root());
        let element = doc
            .element_by_id(&spec.id)
            .with_context(|| format!("no element with id '{}'", spec.id))?;
        let text = doc
            .first_text_node(element)
            .with_context(|| format!("element '{}' has no text", spec.id))?;

        let mut timers = TimerQueue::new();
        let mut observer = SelectionObserver::new(
            root,
            ObserverConfig {
                debounce_ms: config.debounce_ms,
                highlight_class: config.highlight_class.clone(),
            },
        );
        observer.start();
        observer.selection_changed(
            Selection::single(marginalia_engine::LiveRange::new(
                text, spec.start, text, spec.end,
            )),
            &mut timers,
            0,
        );
        let outcome = timers
            .fire_due(config.debounce_ms)
            .into_iter()
            .find_map(|token| observer.handle_timer(token, &mut doc, &geometry, false));
        match outcome {
            Some(SelectionOutcome::Selected(region)) => {
                let anchors = serde_json::to_string(&region.raw_ranges)?;
                log::info!("selection anchored as {anchors}");
            }
            Some(SelectionOutcome::Failed) => bail!("selection could not be anchored"),
            _ => bail!("selection did not produce a highlight"),
        }
    }

    // The comment layer stays applied in the emitted markup.
    drop(layer);
    println!("{}", doc.to_html());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 4 {
        eprintln!("Usage: {} <document.xhtml> [comments.json] [id:start-end]", args[0]);
        eprintln!("Config file: {}", Config::config_path().display());
        process::exit(1);
    }

    let document_path = &args[1];
    if !PathBuf::from(document_path).exists() {
        eprintln!("Error: Document '{document_path}' does not exist");
        process::exit(1);
    }

    // A trailing id:start-end argument is a selection; anything else is the
    // comments file.
    let mut comments_path = None;
    let mut selection = None;
    for arg in &args[2..] {
        if arg.contains(':') {
            selection = Some(parse_selection(arg)?);
        } else {
            comments_path = Some(arg.as_str());
        }
    }

    run(document_path, comments_path, selection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_selection_spec() {
        let spec = parse_selection("text0:7-12").unwrap();
        assert_eq!(spec.id, "text0");
        assert_eq!(spec.start, 7);
        assert_eq!(spec.end, 12);
    }

    #[test]
    fn rejects_malformed_selection_specs() {
        assert!(parse_selection("text0").is_err());
        assert!(parse_selection("text0:7").is_err());
        assert!(parse_selection(":7-12").is_err());
        assert!(parse_selection("text0:12-7").is_err());
    }
}
