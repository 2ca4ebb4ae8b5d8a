// harness/mod.rs - Suite registry and runner
//
// Cases are registered under named suites and executed one after another
// against a shared context (the store). A case fails when it returns an error
// or panics; either way the runner moves on, and the report lists every
// failure at the end.

pub mod gate;

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::future::BoxFuture;
use futures::FutureExt;

pub use gate::{describe, describe_if, DescribeFn};

type Case<C> = Box<dyn Fn(C) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

struct RegisteredCase<C> {
    name: String,
    run: Case<C>,
}

/// A named group of cases
pub struct Suite<C> {
    name: String,
    cases: Vec<RegisteredCase<C>>,
}

impl<C: 'static> Suite<C> {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cases: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register one async case
    pub fn test<F, Fut>(&mut self, name: &str, case: F) -> &mut Self
    where
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.cases.push(RegisteredCase {
            name: name.to_string(),
            run: Box::new(move |ctx| case(ctx).boxed()),
        });
        self
    }
}

/// All suites registered for one test binary
pub struct Registry<C> {
    suites: Vec<Suite<C>>,
}

impl<C> Default for Registry<C> {
    fn default() -> Self {
        Self { suites: Vec::new() }
    }
}

impl<C: Clone + 'static> Registry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a suite unconditionally
    pub fn describe<B>(&mut self, name: &str, body: B) -> &mut Self
    where
        B: FnOnce(&mut Suite<C>),
    {
        let mut suite = Suite::new(name);
        body(&mut suite);
        tracing::debug!(suite = name, cases = suite.cases.len(), "suite registered");
        self.suites.push(suite);
        self
    }

    pub fn suite_names(&self) -> impl Iterator<Item = &str> {
        self.suites.iter().map(|suite| suite.name())
    }

    pub fn case_count(&self) -> usize {
        self.suites.iter().map(|suite| suite.cases.len()).sum()
    }

    /// Run every case in registration order, each with its own clone of `ctx`
    pub async fn run(&self, ctx: C) -> RunReport {
        let mut report = RunReport::default();

        for suite in &self.suites {
            for case in &suite.cases {
                let name = format!("{} > {}", suite.name, case.name);
                tracing::info!(case = %name, "running");

                let outcome = AssertUnwindSafe((case.run)(ctx.clone())).catch_unwind().await;
                match outcome {
                    Ok(Ok(())) => {
                        tracing::info!(case = %name, "passed");
                        report.passed.push(name);
                    }
                    Ok(Err(err)) => {
                        tracing::error!(case = %name, error = %format!("{err:#}"), "failed");
                        report.failed.push(Failure {
                            case: name,
                            message: format!("{err:#}"),
                        });
                    }
                    Err(panic) => {
                        let message = panic_message(panic.as_ref());
                        tracing::error!(case = %name, %message, "panicked");
                        report.failed.push(Failure { case: name, message });
                    }
                }
            }
        }

        report
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Failure {
    pub case: String,
    pub message: String,
}

/// Outcome of a [`Registry::run`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub passed: Vec<String>,
    pub failed: Vec<Failure>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.passed.len() + self.failed.len()
    }

    /// Panic with every failure listed, so the test binary reports them all at once
    pub fn assert_all_passed(&self) {
        if self.is_success() {
            return;
        }

        let details: Vec<String> = self
            .failed
            .iter()
            .map(|failure| format!("  ✗ {}\n    {}", failure.case, failure.message))
            .collect();

        panic!(
            "{} of {} cases failed:\n{}",
            self.failed.len(),
            self.total(),
            details.join("\n")
        );
    }
}
