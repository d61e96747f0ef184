//! End-to-end linking scenarios over small in-memory vaults

use std::sync::atomic::AtomicBool;
use weaver_config::{builtin_rules, LinkingConfig, RuleKind, VariantRule};
use weaver_core::{
    Corpus, Decision, Document, Engine, EngineOptions, Plan, ResolveMode, RuleTable, SkipReason,
};

fn engine_with(docs: Vec<Document>, rules: &[VariantRule], options: EngineOptions) -> Engine {
    Engine::new(Corpus::new(docs), &RuleTable::new(rules, 16), options, None).unwrap()
}

async fn run(engine: &Engine) -> Plan {
    let analysis = engine.analyze(&AtomicBool::new(false)).await.unwrap();
    engine.plan(&analysis)
}

fn body_after(engine: &Engine, plan: &Plan, id: &str) -> String {
    let outcome = engine.commit(plan);
    assert!(outcome.failures.is_empty(), "{:?}", outcome.failures);
    outcome
        .updated
        .into_iter()
        .find(|d| d.id == id)
        .map(|d| d.body().to_string())
        .unwrap_or_else(|| engine.corpus().get(id).unwrap().body().to_string())
}

#[tokio::test]
async fn sso_alias_is_an_exact_match() {
    let engine = engine_with(
        vec![
            Document::parse("Single Sign-On.md", "---\naliases: [SSO]\n---\nAuth.\n"),
            Document::parse("login.md", "Use SSO for login.\n"),
        ],
        &builtin_rules(),
        EngineOptions::new(LinkingConfig::default()),
    );
    let plan = run(&engine).await;

    assert_eq!(plan.replacement_count(), 1);
    assert!(plan.alias_additions.is_empty());
    assert_eq!(
        body_after(&engine, &plan, "login"),
        "Use [[Single Sign-On|SSO]] for login.\n"
    );
}

#[tokio::test]
async fn existing_wikilinks_are_untouched() {
    let engine = engine_with(
        vec![
            Document::parse("Linked.md", "Target"),
            Document::parse("already.md", "Other"),
            Document::parse("note.md", "See [[already|Linked]] here.\n"),
        ],
        &[],
        EngineOptions::new(LinkingConfig::default()),
    );
    let plan = run(&engine).await;
    assert!(plan.is_empty());
}

#[tokio::test]
async fn reference_definition_lines_get_no_candidates() {
    let engine = engine_with(
        vec![
            Document::parse("Rust.md", "Language"),
            Document::parse("refs.md", "[Rust]: https://rust-lang.org\n[docs|Rust]: https://doc.rust-lang.org\n"),
        ],
        &[],
        EngineOptions::new(LinkingConfig::default()),
    );
    let analysis = engine.analyze(&AtomicBool::new(false)).await.unwrap();
    assert_eq!(analysis.candidate_count(), 0);
}

fn api_vault() -> (Vec<Document>, Vec<VariantRule>) {
    let docs = vec![
        Document::parse("C.md", "---\ntitle: エーピーアイ\n---\nカタカナ\n"),
        Document::parse("D.md", "---\ntitle: Application Programming Interface\n---\nInterfaces\n"),
        Document::parse("note.md", "Call the API today.\n"),
    ];
    let rules = vec![
        VariantRule::new(RuleKind::ScriptPair, "API", &["エーピーアイ"]).with_confidence(0.72),
        VariantRule::new(RuleKind::Abbreviation, "API", &["Application Programming Interface"])
            .with_confidence(0.70),
    ];
    (docs, rules)
}

#[tokio::test]
async fn ambiguous_api_picks_best_automatically() {
    let (docs, rules) = api_vault();
    let engine = engine_with(docs, &rules, EngineOptions::new(LinkingConfig::default()));
    let analysis = engine.analyze(&AtomicBool::new(false)).await.unwrap();

    let note = analysis.documents.iter().find(|d| d.document_id == "note").unwrap();
    assert_eq!(note.candidates.len(), 1);
    match &note.candidates[0].decision {
        Decision::Accepted { target, ambiguous } => {
            assert_eq!(target.document_id, "C");
            assert!(*ambiguous);
        }
        other => panic!("unexpected decision {other:?}"),
    }

    let plan = engine.plan(&analysis);
    assert_eq!(plan.replacement_count(), 1);
    assert_eq!(plan.alias_additions.len(), 1);
    assert_eq!(plan.alias_additions[0].document_id, "C");
    assert_eq!(plan.alias_additions[0].new_alias, "API");
}

#[tokio::test]
async fn ambiguous_api_waits_for_user_in_interactive_mode() {
    let (docs, rules) = api_vault();
    let mut options = EngineOptions::new(LinkingConfig::default());
    options.mode = ResolveMode::Interactive;
    let engine = engine_with(docs, &rules, options);
    let mut analysis = engine.analyze(&AtomicBool::new(false)).await.unwrap();

    let pending: Vec<_> = analysis.pending().collect();
    assert_eq!(pending.len(), 1);
    let (doc_id, scored) = pending[0];
    assert_eq!(doc_id, "note");
    let Decision::AwaitingUser { shortlist } = &scored.decision else {
        panic!("expected a shortlist");
    };
    let ids: Vec<_> = shortlist.iter().map(|t| t.document_id.as_str()).collect();
    assert_eq!(ids, vec!["C", "D"]);

    // Unresolved candidates are not linked
    assert!(engine.plan(&analysis).is_empty());

    let span = scored.candidate.span;
    assert!(analysis.resolve("note", span, Some("D")));
    let plan = engine.plan(&analysis);
    assert_eq!(
        body_after(&engine, &plan, "note"),
        "Call the [[D|Application Programming Interface]] today.\n"
    );
}

#[tokio::test]
async fn link_cap_keeps_earliest_links() {
    let mut linking = LinkingConfig::default();
    linking.max_links_per_document = 2;
    let engine = engine_with(
        vec![
            Document::parse("Alpha.md", "a"),
            Document::parse("Beta.md", "b"),
            Document::parse("Gamma.md", "c"),
            Document::parse("list.md", "Gamma, Beta and Alpha.\n"),
        ],
        &[],
        EngineOptions::new(linking),
    );
    let plan = run(&engine).await;
    assert_eq!(
        body_after(&engine, &plan, "list"),
        "[[Gamma]], [[Beta]] and Alpha.\n"
    );
}

#[tokio::test]
async fn protected_regions_are_skipped() {
    let engine = engine_with(
        vec![
            Document::parse("Rust.md", "lang"),
            Document::parse(
                "mixed.md",
                "Rust intro\n\n```\nRust in code\n```\n\n`Rust` inline, ${Rust} and {{Rust}}.\n\n[Rust](https://rust-lang.org) and Rust.\n",
            ),
        ],
        &[],
        EngineOptions::new(LinkingConfig::default()),
    );
    let plan = run(&engine).await;
    assert_eq!(
        body_after(&engine, &plan, "mixed"),
        "[[Rust]] intro\n\n```\nRust in code\n```\n\n`Rust` inline, ${Rust} and {{Rust}}.\n\n[Rust](https://rust-lang.org) and [[Rust]].\n"
    );
}

#[tokio::test]
async fn second_run_on_output_is_a_no_op() {
    let docs = vec![
        Document::parse("DB.md", "---\ntitle: DB\n---\nStorage\n"),
        Document::parse("Single Sign-On.md", "---\naliases: [SSO]\n---\nAuth\n"),
        Document::parse("notes.md", "The database needs SSO.\n\nAnother database row.\n"),
    ];
    let engine = engine_with(docs, &builtin_rules(), EngineOptions::new(LinkingConfig::default()));
    let plan = run(&engine).await;
    assert!(plan.replacement_count() > 0);

    let outcome = engine.commit(&plan);
    let rewritten: Vec<Document> = engine
        .corpus()
        .iter()
        .map(|doc| {
            let current = outcome.updated.iter().find(|d| d.id == doc.id).unwrap_or(doc);
            Document::parse(current.path(), &current.render().unwrap())
        })
        .collect();

    let again = engine_with(rewritten, &builtin_rules(), EngineOptions::new(LinkingConfig::default()));
    let second = run(&again).await;
    assert_eq!(second.replacement_count(), 0);
    assert!(second.alias_additions.is_empty());
}

#[tokio::test]
async fn runs_are_deterministic() {
    let docs = || {
        vec![
            Document::parse("DB.md", "---\ntitle: DB\n---\n"),
            Document::parse("API.md", "---\naliases: [interface]\n---\n"),
            Document::parse("a.md", "A database behind an API.\n"),
            Document::parse("b.md", "The interface of the DB.\n"),
        ]
    };
    let first = run(&engine_with(docs(), &builtin_rules(), EngineOptions::new(LinkingConfig::default()))).await;
    let second = run(&engine_with(docs(), &builtin_rules(), EngineOptions::new(LinkingConfig::default()))).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn invalid_target_header_blocks_only_the_alias() {
    let engine = engine_with(
        vec![
            Document::parse("DB.md", "---\ntitle: [unclosed\n---\nbody\n"),
            Document::parse("n.md", "A database here.\n"),
        ],
        &builtin_rules(),
        EngineOptions::new(LinkingConfig::default()),
    );
    let plan = run(&engine).await;
    assert_eq!(plan.replacement_count(), 1);
    assert!(plan.alias_additions.is_empty());
    assert_eq!(plan.skipped_aliases.len(), 1);
    assert_eq!(body_after(&engine, &plan, "n"), "A [[DB]] here.\n");
}

#[tokio::test]
async fn names_with_link_syntax_are_left_alone() {
    let engine = engine_with(
        vec![
            Document::parse("C#.md", "A language.\n"),
            Document::parse("n.md", "I write C# daily.\n"),
        ],
        &[],
        EngineOptions::new(LinkingConfig::default()),
    );
    let plan = run(&engine).await;

    assert_eq!(plan.replacement_count(), 0);
    let doc = plan.documents.iter().find(|d| d.document_id == "n").unwrap();
    assert_eq!(doc.skipped_links.len(), 1);
    assert_eq!(doc.skipped_links[0].reason, SkipReason::ReservedCharacters);
    assert_eq!(body_after(&engine, &plan, "n"), "I write C# daily.\n");
}
