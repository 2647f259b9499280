//! Context resolution: walks a recipe's context and collects user input.
//!
//! Entries are visited in declaration order. A user-input source is found
//! either directly in an entry's `from` or as an item of a combined source;
//! every other source kind is skipped. Each parameter is prompted once, in
//! order, and answers merge into one flat map where the last write wins.
//!
//! Cancellation is cooperative: the token is checked before every prompt and
//! never during one. An in-flight prompt is the ask capability's business.

use super::types::*;
use crate::prompt::{Ask, AskError};
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A user-input source and where it sits in the context.
#[derive(Debug, Clone, Copy)]
pub struct SourceRef<'a> {
    /// Index of the context entry
    pub entry: usize,
    /// Path of the context entry
    pub path: &'a str,
    /// Index within a combined source; `None` for a direct source
    pub item: Option<usize>,
    /// The source itself
    pub source: &'a UserInputSource,
}

impl fmt::Display for SourceRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "context entry #{}", self.entry + 1)?;
        if !self.path.is_empty() {
            write!(f, " ({})", self.path)?;
        }
        if let Some(item) = self.item {
            write!(f, ", combined item #{}", item + 1)?;
        }
        Ok(())
    }
}

/// Every user-input source in the recipe, in the order it will be prompted.
pub fn user_input_sources(recipe: &Recipe) -> Vec<SourceRef<'_>> {
    let Some(context) = recipe.context.as_ref() else {
        return Vec::new();
    };

    let mut sources = Vec::new();
    for (entry_idx, entry) in context.entries.iter().enumerate() {
        match &entry.from {
            Some(ContextSource::UserInput(ui)) => sources.push(SourceRef {
                entry: entry_idx,
                path: &entry.path,
                item: None,
                source: ui,
            }),
            Some(ContextSource::Combined(combined)) => {
                for (item_idx, item) in combined.items.iter().enumerate() {
                    match &item.source {
                        Some(ItemSource::UserInput(ui)) => sources.push(SourceRef {
                            entry: entry_idx,
                            path: &entry.path,
                            item: Some(item_idx),
                            source: ui,
                        }),
                        // Materializer's concern, not input collection's
                        Some(ItemSource::Other(_)) | None => {}
                    }
                }
            }
            Some(ContextSource::Other(_)) | None => {}
        }
    }
    sources
}

/// Every parameter that would be prompted, in prompt order.
pub fn collect_parameters(recipe: &Recipe) -> Vec<&UserInputParameter> {
    user_input_sources(recipe)
        .into_iter()
        .flat_map(|s| s.source.entries.iter())
        .collect()
}

/// Label shown to the operator: `name`, or `name (description)`.
pub fn prompt_label(param: &UserInputParameter) -> String {
    if param.description.is_empty() {
        param.name.clone()
    } else {
        format!("{} ({})", param.name, param.description)
    }
}

/// Presence rule: blank input is rejected unless the parameter is optional.
pub fn check_answer(optional: bool, input: &str) -> Result<(), String> {
    if !optional && input.trim().is_empty() {
        return Err("required".to_string());
    }
    Ok(())
}

/// Why a resolution stopped early.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The token was cancelled before a prompt could be issued
    #[error("input collection cancelled")]
    Cancelled,

    /// The ask capability failed; carried unchanged
    #[error(transparent)]
    Ask(#[from] AskError),
}

/// One answered prompt, in the order asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompted {
    pub name: String,
    /// Blank answer to an optional parameter
    pub skipped: bool,
}

/// Outcome of one traversal. `answers` holds everything collected, even when
/// `error` is set.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub answers: AnswerMap,
    pub prompted: Vec<Prompted>,
    pub error: Option<ResolveError>,
}

impl Resolution {
    pub fn outcome(&self) -> ResolutionOutcome {
        match self.error {
            None => ResolutionOutcome::Completed,
            Some(ResolveError::Cancelled) => ResolutionOutcome::Cancelled,
            Some(ResolveError::Ask(_)) => ResolutionOutcome::Failed,
        }
    }

    /// Drop the partial answers on failure.
    pub fn into_result(self) -> Result<AnswerMap, ResolveError> {
        match self.error {
            None => Ok(self.answers),
            Some(e) => Err(e),
        }
    }
}

/// Resolution engine. Owns the injected ask capability.
pub struct InputCollector<A> {
    ask: A,
}

impl<A: Ask> InputCollector<A> {
    pub fn new(ask: A) -> Self {
        Self { ask }
    }

    pub fn ask(&self) -> &A {
        &self.ask
    }

    pub fn into_inner(self) -> A {
        self.ask
    }

    /// Prompt for every user-input parameter in `recipe`, in declaration
    /// order. Stops at the first cancellation or ask failure.
    pub fn request(&mut self, cancel: &CancellationToken, recipe: &Recipe) -> Resolution {
        let mut resolution = Resolution::default();

        for source in user_input_sources(recipe) {
            if let Err(e) = self.prompt_source(cancel, &source, &mut resolution) {
                resolution.error = Some(e);
                break;
            }
        }

        match &resolution.error {
            None => info!(
                recipe = recipe.display_name(),
                collected = resolution.answers.len(),
                "input collection complete"
            ),
            Some(ResolveError::Cancelled) => warn!(
                recipe = recipe.display_name(),
                collected = resolution.answers.len(),
                "input collection cancelled"
            ),
            Some(ResolveError::Ask(e)) => warn!(
                recipe = recipe.display_name(),
                collected = resolution.answers.len(),
                error = %e,
                "input collection failed"
            ),
        }
        resolution
    }

    fn prompt_source(
        &mut self,
        cancel: &CancellationToken,
        source: &SourceRef<'_>,
        resolution: &mut Resolution,
    ) -> Result<(), ResolveError> {
        for param in &source.source.entries {
            if cancel.is_cancelled() {
                return Err(ResolveError::Cancelled);
            }

            let optional = param.optional;
            let validate = move |input: &str| check_answer(optional, input);
            debug!(name = %param.name, optional, at = %source, "prompting");

            let answer = self.ask.ask(&prompt_label(param), &validate)?;
            let skipped = answer.trim().is_empty();
            if !skipped {
                // Raw value, untrimmed
                resolution.answers.insert(param.name.clone(), answer);
            }
            resolution.prompted.push(Prompted {
                name: param.name.clone(),
                skipped,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedAsk;
    use proptest::prelude::*;
    use serde_json::Value;

    fn param(name: &str, optional: bool) -> UserInputParameter {
        UserInputParameter {
            name: name.to_string(),
            description: String::new(),
            optional,
        }
    }

    fn direct(path: &str, params: Vec<UserInputParameter>) -> ContextEntry {
        ContextEntry {
            path: path.to_string(),
            from: Some(ContextSource::UserInput(UserInputSource { entries: params })),
        }
    }

    fn combined(path: &str, items: Vec<ItemSource>) -> ContextEntry {
        ContextEntry {
            path: path.to_string(),
            from: Some(ContextSource::Combined(CombinedSource {
                items: items
                    .into_iter()
                    .map(|s| CombinedItem { source: Some(s) })
                    .collect(),
            })),
        }
    }

    fn text(s: &str) -> OpaqueSource {
        OpaqueSource {
            kind: "text".to_string(),
            value: Value::String(s.to_string()),
        }
    }

    fn recipe_with(entries: Vec<ContextEntry>) -> Recipe {
        Recipe {
            context: Some(Context { entries }),
            ..Recipe::default()
        }
    }

    /// entry1: user_input{a(required), b(optional)}
    /// entry2: combined{user_input{a(required)}}
    fn two_source_recipe() -> Recipe {
        recipe_with(vec![
            direct("path1", vec![param("a", false), param("b", true)]),
            combined(
                "path2",
                vec![ItemSource::UserInput(UserInputSource {
                    entries: vec![param("a", false)],
                })],
            ),
        ])
    }

    #[test]
    fn test_resolver_last_write_wins_and_optional_skip() {
        let recipe = two_source_recipe();
        let before = recipe.clone();

        let mut collector = InputCollector::new(ScriptedAsk::new(["va", "", "vb"]));
        let res = collector.request(&CancellationToken::new(), &recipe);

        assert!(res.error.is_none());
        assert_eq!(res.answers.len(), 1);
        assert_eq!(res.answers["a"], "vb");
        assert!(!res.answers.contains_key("b"));
        assert_eq!(res.outcome(), ResolutionOutcome::Completed);
        assert_eq!(collector.ask().remaining(), 0);
        assert_eq!(recipe, before);
    }

    #[test]
    fn test_resolver_prompted_records() {
        let mut collector = InputCollector::new(ScriptedAsk::new(["va", "  ", "vb"]));
        let res = collector.request(&CancellationToken::new(), &two_source_recipe());
        let names: Vec<_> = res.prompted.iter().map(|p| (p.name.as_str(), p.skipped)).collect();
        assert_eq!(names, vec![("a", false), ("b", true), ("a", false)]);
    }

    #[test]
    fn test_resolver_no_context() {
        let mut collector = InputCollector::new(ScriptedAsk::default());
        let res = collector.request(&CancellationToken::new(), &Recipe::default());
        assert!(res.answers.is_empty());
        assert!(res.error.is_none());
        assert!(collector.ask().asked().is_empty());
    }

    #[test]
    fn test_resolver_empty_context() {
        let mut collector = InputCollector::new(ScriptedAsk::default());
        let res = collector.request(&CancellationToken::new(), &recipe_with(vec![]));
        assert!(res.answers.is_empty());
        assert!(res.error.is_none());
    }

    #[test]
    fn test_resolver_cancelled_before_first_prompt() {
        let recipe = two_source_recipe();
        let before = recipe.clone();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut collector = InputCollector::new(ScriptedAsk::new(["never"]));
        let res = collector.request(&cancel, &recipe);

        assert_eq!(res.error, Some(ResolveError::Cancelled));
        assert!(res.answers.is_empty());
        assert!(collector.ask().asked().is_empty());
        assert_eq!(res.outcome(), ResolutionOutcome::Cancelled);
        assert_eq!(recipe, before);
    }

    /// Ask wrapper that cancels the token after `after` answers.
    struct CancelAfter {
        inner: ScriptedAsk,
        token: CancellationToken,
        after: usize,
    }

    impl Ask for CancelAfter {
        fn ask(
            &mut self,
            label: &str,
            validate: crate::prompt::Validate<'_>,
        ) -> Result<String, AskError> {
            let out = self.inner.ask(label, validate);
            if self.inner.asked().len() >= self.after {
                self.token.cancel();
            }
            out
        }
    }

    #[test]
    fn test_resolver_cancelled_midway_keeps_partial() {
        let token = CancellationToken::new();
        let ask = CancelAfter {
            inner: ScriptedAsk::new(["first", "second", "third"]),
            token: token.clone(),
            after: 1,
        };
        let mut collector = InputCollector::new(ask);
        let res = collector.request(&token, &two_source_recipe());

        // The in-flight answer is kept; the next prompt is never issued.
        assert_eq!(res.error, Some(ResolveError::Cancelled));
        assert_eq!(res.answers.len(), 1);
        assert_eq!(res.answers["a"], "first");
        assert_eq!(collector.into_inner().inner.asked().len(), 1);
    }

    #[test]
    fn test_resolver_ask_failure_on_first_call() {
        let recipe = recipe_with(vec![direct("x.md", vec![param("x", false)])]);
        let mut collector =
            InputCollector::new(ScriptedAsk::default().then_fail(AskError::Aborted));
        let res = collector.request(&CancellationToken::new(), &recipe);

        assert!(res.answers.is_empty());
        assert_eq!(res.error, Some(ResolveError::Ask(AskError::Aborted)));
        assert_eq!(res.outcome(), ResolutionOutcome::Failed);
    }

    #[test]
    fn test_resolver_ask_failure_keeps_partial() {
        let ask = ScriptedAsk::new(["va"]).then_fail(AskError::Io("tty gone".into()));
        let mut collector = InputCollector::new(ask);
        let res = collector.request(&CancellationToken::new(), &two_source_recipe());

        assert_eq!(res.answers["a"], "va");
        assert_eq!(res.error, Some(ResolveError::Ask(AskError::Io("tty gone".into()))));
        let err = res.into_result().unwrap_err();
        assert_eq!(err.to_string(), "prompt I/O failed: tty gone");
    }

    #[test]
    fn test_resolver_required_rejects_blank() {
        let recipe = recipe_with(vec![direct("x.md", vec![param("x", false)])]);
        let mut collector = InputCollector::new(ScriptedAsk::new(["   "]));
        let res = collector.request(&CancellationToken::new(), &recipe);

        assert!(res.answers.is_empty());
        assert_eq!(
            res.error,
            Some(ResolveError::Ask(AskError::Rejected("required".to_string())))
        );
    }

    #[test]
    fn test_resolver_stores_untrimmed_value() {
        let recipe = recipe_with(vec![direct("x.md", vec![param("x", false)])]);
        let mut collector = InputCollector::new(ScriptedAsk::new(["  padded "]));
        let answers = collector
            .request(&CancellationToken::new(), &recipe)
            .into_result()
            .unwrap();
        assert_eq!(answers["x"], "  padded ");
    }

    #[test]
    fn test_resolver_skips_sourceless_and_opaque() {
        let recipe = recipe_with(vec![
            ContextEntry {
                path: "none.md".to_string(),
                from: None,
            },
            ContextEntry {
                path: "static.md".to_string(),
                from: Some(ContextSource::Other(text("hello"))),
            },
            combined(
                "mixed.md",
                vec![
                    ItemSource::Other(text("preamble")),
                    ItemSource::UserInput(UserInputSource {
                        entries: vec![param("goal", false)],
                    }),
                ],
            ),
            ContextEntry {
                path: "empty-item.md".to_string(),
                from: Some(ContextSource::Combined(CombinedSource {
                    items: vec![CombinedItem { source: None }],
                })),
            },
        ]);

        let mut collector = InputCollector::new(ScriptedAsk::new(["ship it"]));
        let res = collector.request(&CancellationToken::new(), &recipe);

        assert!(res.error.is_none());
        assert_eq!(res.answers["goal"], "ship it");
        assert_eq!(collector.ask().asked(), ["goal"]);
    }

    #[test]
    fn test_resolver_labels_include_description() {
        let recipe = recipe_with(vec![direct(
            "x.md",
            vec![
                UserInputParameter {
                    name: "repo".to_string(),
                    description: "Repository URL".to_string(),
                    optional: false,
                },
                param("branch", true),
            ],
        )]);
        let mut collector = InputCollector::new(ScriptedAsk::new(["r", ""]));
        collector.request(&CancellationToken::new(), &recipe);
        assert_eq!(collector.ask().asked(), ["repo (Repository URL)", "branch"]);
    }

    #[test]
    fn test_resolver_check_answer() {
        assert_eq!(check_answer(false, ""), Err("required".to_string()));
        assert_eq!(check_answer(false, " \t\n"), Err("required".to_string()));
        assert!(check_answer(false, "x").is_ok());
        assert!(check_answer(true, "").is_ok());
        assert!(check_answer(true, "   ").is_ok());
    }

    #[test]
    fn test_resolver_collect_parameters_order() {
        let recipe = two_source_recipe();
        let names: Vec<_> = collect_parameters(&recipe)
            .into_iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_resolver_source_ref_display() {
        let recipe = two_source_recipe();
        let sources = user_input_sources(&recipe);
        assert_eq!(sources[0].to_string(), "context entry #1 (path1)");
        assert_eq!(
            sources[1].to_string(),
            "context entry #2 (path2), combined item #1"
        );
    }

    // ------------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------------

    #[derive(Debug, Clone)]
    struct Case {
        name: String,
        optional: bool,
        answer: String,
        in_combined: bool,
    }

    fn case_strategy() -> impl Strategy<Value = Case> {
        (
            "[a-d]",
            any::<bool>(),
            prop_oneof![
                Just(String::new()),
                Just(" ".to_string()),
                Just("\t ".to_string()),
                "[a-z]{1,4}",
                " [a-z]{1,3} ",
            ],
            any::<bool>(),
        )
            .prop_map(|(name, optional, answer, in_combined)| Case {
                name,
                optional,
                answer,
                in_combined,
            })
    }

    fn build(cases: &[Case]) -> Recipe {
        let entries = cases
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let p = param(&c.name, c.optional);
                if c.in_combined {
                    combined(
                        &format!("e{}", i),
                        vec![
                            ItemSource::Other(text("static")),
                            ItemSource::UserInput(UserInputSource { entries: vec![p] }),
                        ],
                    )
                } else {
                    direct(&format!("e{}", i), vec![p])
                }
            })
            .collect();
        recipe_with(entries)
    }

    proptest! {
        #[test]
        fn prop_resolver_matches_sequential_model(cases in prop::collection::vec(case_strategy(), 0..8)) {
            let recipe = build(&cases);
            let before = recipe.clone();
            let answers: Vec<String> = cases.iter().map(|c| c.answer.clone()).collect();

            let mut collector = InputCollector::new(ScriptedAsk::new(answers));
            let res = collector.request(&CancellationToken::new(), &recipe);

            // Reference model: fold in order, stop at the first rejected blank.
            let mut expected = AnswerMap::new();
            let mut expected_err = None;
            for c in &cases {
                let blank = c.answer.trim().is_empty();
                if blank && !c.optional {
                    expected_err = Some(ResolveError::Ask(AskError::Rejected("required".into())));
                    break;
                }
                if !blank {
                    expected.insert(c.name.clone(), c.answer.clone());
                }
            }

            prop_assert_eq!(&res.error, &expected_err);
            prop_assert_eq!(&res.answers, &expected);
            prop_assert!(res.answers.values().all(|v| !v.trim().is_empty()));
            prop_assert_eq!(recipe, before);
        }

        #[test]
        fn prop_resolver_cancelled_never_asks(cases in prop::collection::vec(case_strategy(), 0..8)) {
            let recipe = build(&cases);
            let cancel = CancellationToken::new();
            cancel.cancel();
            let mut collector = InputCollector::new(ScriptedAsk::new(["x"]));
            let res = collector.request(&cancel, &recipe);

            prop_assert!(res.answers.is_empty());
            prop_assert!(collector.ask().asked().is_empty());
            if cases.is_empty() {
                prop_assert!(res.error.is_none());
            } else {
                prop_assert_eq!(res.error, Some(ResolveError::Cancelled));
            }
        }
    }
}
