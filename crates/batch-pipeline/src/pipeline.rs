//! Pipeline assembly: chaining transform nodes downstream of a source.
//!
//! A [`Pipeline`] owns a leaf source provider and an ordered list of
//! nodes; the last node added is the most downstream. Requests enter at
//! the downstream end, get rewritten stage by stage on the way up, and
//! batches flow back down through each stage's post-processing.
//!
//! Composition is an explicit builder rather than an operator:
//! `Pipeline::new(source).then(a).then(b)`. [`chain`] composes nodes into
//! a [`NodeChain`] ahead of attachment, and the grouping does not matter:
//! `pipeline.then(a).then(b)` and `pipeline.then(chain(a, b))` declare the
//! same specs and produce identical batches.

use crate::batch::{Batch, BatchRequest};
use crate::error::{PipelineError, Result};
use crate::provider::{Node, Provider, SpecTable};

/// One attached node plus the spec table its upstream view exposes.
struct Stage {
    node: Box<dyn Node>,
    /// Specs visible upstream of this node; filled in during setup.
    upstream_specs: SpecTable,
}

impl Stage {
    fn new(node: impl Node + 'static) -> Self {
        Self {
            node: Box::new(node),
            upstream_specs: SpecTable::new(),
        }
    }
}

/// A source provider with zero or more transform nodes chained downstream.
pub struct Pipeline {
    source: Box<dyn Provider>,
    stages: Vec<Stage>,
    specs: SpecTable,
    ready: bool,
}

impl Pipeline {
    /// Start a pipeline at a leaf source.
    pub fn new(source: impl Provider + 'static) -> Self {
        Self {
            source: Box::new(source),
            stages: Vec::new(),
            specs: SpecTable::new(),
            ready: false,
        }
    }

    /// Attach a node as the new most-downstream stage.
    pub fn then(mut self, node: impl Node + 'static) -> Self {
        self.stages.push(Stage::new(node));
        self
    }
}

impl Provider for Pipeline {
    /// Set up upstream-first: the source, then each node in order. Every
    /// node sees the accumulated upstream declarations and adds its own.
    fn setup(&mut self) -> Result<()> {
        if self.ready {
            return Err(PipelineError::NotSetUp);
        }
        self.source.setup()?;
        let mut acc = self.source.specs().clone();
        for stage in &mut self.stages {
            stage.upstream_specs = acc.clone();
            let added = stage.node.setup(&acc)?;
            acc.merge(added)?;
        }
        self.specs = acc;
        self.ready = true;
        tracing::debug!(
            arrays = self.specs.len(),
            stages = self.stages.len(),
            "pipeline ready"
        );
        Ok(())
    }

    fn specs(&self) -> &SpecTable {
        &self.specs
    }

    fn provide(&mut self, request: &BatchRequest) -> Result<Batch> {
        if !self.ready {
            return Err(PipelineError::NotSetUp);
        }
        // An undeclared key fails before any stage sees the request.
        for (key, _) in request.iter() {
            if !self.specs.contains(key) {
                return Err(PipelineError::UnknownKey { key: key.clone() });
            }
        }
        provide_stages(self.source.as_mut(), &mut self.stages, request)
    }
}

/// Drive the most-downstream stage, handing it a provider view of
/// everything upstream of it. With no stages left, the source serves the
/// request directly.
fn provide_stages(
    source: &mut dyn Provider,
    stages: &mut [Stage],
    request: &BatchRequest,
) -> Result<Batch> {
    match stages.split_last_mut() {
        None => source.provide(request),
        Some((last, upstream_stages)) => {
            let mut upstream = UpstreamView {
                source,
                stages: upstream_stages,
                specs: &last.upstream_specs,
            };
            last.node.provide(request, &mut upstream)
        }
    }
}

/// The part of a pipeline upstream of one stage, presented as a provider.
struct UpstreamView<'a> {
    source: &'a mut dyn Provider,
    stages: &'a mut [Stage],
    specs: &'a SpecTable,
}

impl Provider for UpstreamView<'_> {
    fn setup(&mut self) -> Result<()> {
        // The owning pipeline has already set these stages up.
        Ok(())
    }

    fn specs(&self) -> &SpecTable {
        self.specs
    }

    fn provide(&mut self, request: &BatchRequest) -> Result<Batch> {
        provide_stages(self.source, self.stages, request)
    }
}

/// Several nodes composed into one, upstream to downstream.
///
/// A `NodeChain` is itself a [`Node`], so chains can be built separately
/// and attached with a single [`Pipeline::then`].
pub struct NodeChain {
    stages: Vec<Stage>,
}

impl NodeChain {
    /// Extend the chain with a further downstream node.
    pub fn then(mut self, node: impl Node + 'static) -> Self {
        self.stages.push(Stage::new(node));
        self
    }
}

/// Compose two nodes: `a` upstream, `b` downstream.
pub fn chain(a: impl Node + 'static, b: impl Node + 'static) -> NodeChain {
    NodeChain {
        stages: vec![Stage::new(a), Stage::new(b)],
    }
}

impl Node for NodeChain {
    fn setup(&mut self, upstream: &SpecTable) -> Result<SpecTable> {
        let mut acc = upstream.clone();
        let mut added_all = SpecTable::new();
        for stage in &mut self.stages {
            stage.upstream_specs = acc.clone();
            let added = stage.node.setup(&acc)?;
            for (key, spec) in added.iter() {
                added_all.declare(key.clone(), *spec)?;
            }
            acc.merge(added)?;
        }
        Ok(added_all)
    }

    fn provide(&mut self, request: &BatchRequest, upstream: &mut dyn Provider) -> Result<Batch> {
        provide_stages(upstream, &mut self.stages, request)
    }
}
