// src/pipeline/compose.rs

//! Series / parallel composition of jobs.
//!
//! A [`Composition`] is a tree: leaves are [`Job`]s, inner nodes run their
//! children one after another or all at once. Every node completes exactly
//! once, when its future resolves.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::warn;

use crate::errors::{Result, SitepipeError};
use crate::pipeline::context::BuildContext;

pub type JobFuture = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

/// Anything that can sit at a leaf of a composition.
pub trait Job: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn run(self: Arc<Self>, ctx: Arc<BuildContext>) -> JobFuture;
}

#[derive(Debug, Clone)]
pub enum Composition {
    Job(Arc<dyn Job>),
    /// Start each child only after the previous one completed successfully.
    /// The first failure stops the series.
    Series(Vec<Composition>),
    /// Start all children at once and wait for every one of them. A failing
    /// child does not cancel its siblings; the first failure is reported.
    Parallel(Vec<Composition>),
}

impl Composition {
    pub fn job(job: impl Job + 'static) -> Self {
        Composition::Job(Arc::new(job))
    }

    /// Run the composition. An empty series or parallel group completes
    /// immediately.
    pub fn run(&self, ctx: Arc<BuildContext>) -> JobFuture {
        let this = self.clone();
        Box::pin(async move {
            match this {
                Composition::Job(job) => job.run(ctx).await,
                Composition::Series(items) => {
                    for item in items.iter() {
                        item.run(Arc::clone(&ctx)).await?;
                    }
                    Ok(())
                }
                Composition::Parallel(items) => run_parallel(items, ctx).await,
            }
        })
    }
}

async fn run_parallel(items: Vec<Composition>, ctx: Arc<BuildContext>) -> Result<()> {
    let mut set = JoinSet::new();
    for item in items.iter() {
        set.spawn(item.run(Arc::clone(&ctx)));
    }

    let mut first_error = None;
    while let Some(joined) = set.join_next().await {
        let result = joined.map_err(|e| {
            SitepipeError::Other(anyhow::anyhow!("parallel branch did not finish: {e}"))
        });
        if let Err(err) | Ok(Err(err)) = result {
            if first_error.is_none() {
                first_error = Some(err);
            } else {
                warn!(error = %err, "additional failure in parallel group");
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (label, items) = match self {
            Composition::Job(job) => return f.write_str(job.name()),
            Composition::Series(items) => ("series", items),
            Composition::Parallel(items) => ("parallel", items),
        };
        write!(f, "{label}(")?;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{item}")?;
        }
        f.write_str(")")
    }
}
