//! Execution Facade - registry lookup, compile, route, invoke
//!
//! Each call is independent: it takes the current registry snapshot, compiles
//! the record, resolves the provider and makes exactly one backend call. No
//! retries, no caching, no state carried between calls.

use std::future::pending;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::select;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::error::{PromptError, Result};
use crate::llm::LlmClient;
use crate::prompt::{self, PromptRegistry, RegistryHandle, TemplateRecord, Variables};
use crate::provider::ProviderRouter;

/// Outcome of one provider's run of a test case
#[derive(Debug)]
pub struct Evaluation {
    pub provider: String,
    pub result: Result<String>,
    pub latency: Duration,
}

/// Composes the registry, compiler and router into one operation
#[derive(Debug)]
pub struct PromptExecutor {
    registry: Arc<RegistryHandle>,
    router: ProviderRouter,
}

impl PromptExecutor {
    pub fn new(registry: Arc<RegistryHandle>, router: ProviderRouter) -> Self {
        Self { registry, router }
    }

    /// Convenience for a registry that will never be reloaded
    pub fn from_registry(registry: PromptRegistry, router: ProviderRouter) -> Self {
        Self::new(Arc::new(RegistryHandle::new(registry)), router)
    }

    pub fn registry(&self) -> Arc<PromptRegistry> {
        self.registry.snapshot()
    }

    /// Compile a prompt without dispatching it
    pub fn compile(&self, prompt_id: &str, variables: &Variables) -> Result<String> {
        let record = self.lookup(prompt_id)?;
        Ok(prompt::compile(&record, variables))
    }

    /// Compile `prompt_id` with `variables` and send it to `provider`
    pub async fn execute(&self, prompt_id: &str, variables: &Variables, provider: &str) -> Result<String> {
        let (backend, compiled) = self.prepare(prompt_id, variables, provider)?;
        Self::invoke(backend.as_ref(), &compiled).await
    }

    /// Like [`execute`](Self::execute), abandoning the backend call once `cancel` fires
    pub async fn execute_with_cancel(
        &self,
        prompt_id: &str,
        variables: &Variables,
        provider: &str,
        cancel: CancellationToken,
    ) -> Result<String> {
        self.execute_bounded(prompt_id, variables, provider, Some(&cancel), None)
            .await
    }

    /// Like [`execute`](Self::execute), giving up once `deadline` elapses
    pub async fn execute_with_deadline(
        &self,
        prompt_id: &str,
        variables: &Variables,
        provider: &str,
        deadline: Duration,
    ) -> Result<String> {
        self.execute_bounded(prompt_id, variables, provider, None, Some(deadline))
            .await
    }

    /// Honors both a cancellation token and a deadline, whichever comes first
    pub async fn execute_bounded(
        &self,
        prompt_id: &str,
        variables: &Variables,
        provider: &str,
        cancel: Option<&CancellationToken>,
        deadline: Option<Duration>,
    ) -> Result<String> {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(PromptError::Cancelled);
        }
        let (backend, compiled) = self.prepare(prompt_id, variables, provider)?;
        Self::dispatch(prompt_id, backend.as_ref(), &compiled, cancel, deadline).await
    }

    /// Run one of a prompt's test cases against each provider in turn
    ///
    /// Per-provider failures are recorded in the returned list, not raised.
    /// Once `cancel` fires the in-flight call ends as `Cancelled` and the
    /// remaining providers are skipped.
    pub async fn evaluate(
        &self,
        prompt_id: &str,
        test_case: &str,
        providers: &[&str],
        cancel: CancellationToken,
    ) -> Result<Vec<Evaluation>> {
        let record = self.lookup(prompt_id)?;
        let compiled =
            prompt::compile_test_case(&record, test_case).ok_or_else(|| PromptError::TestCaseNotFound {
                prompt_id: prompt_id.to_string(),
                name: test_case.to_string(),
            })?;
        log::info!(
            "Evaluating '{}' test case '{}' against {} providers",
            prompt_id,
            test_case,
            providers.len()
        );

        let mut evaluations = Vec::with_capacity(providers.len());
        for &provider in providers {
            if cancel.is_cancelled() {
                break;
            }
            let started = Instant::now();
            let result = match self.router.resolve(provider) {
                Ok(backend) => Self::dispatch(prompt_id, backend.as_ref(), &compiled, Some(&cancel), None).await,
                Err(e) => Err(e),
            };
            evaluations.push(Evaluation {
                provider: provider.to_string(),
                result,
                latency: started.elapsed(),
            });
        }
        Ok(evaluations)
    }

    fn lookup(&self, prompt_id: &str) -> Result<Arc<TemplateRecord>> {
        self.registry
            .snapshot()
            .get(prompt_id)
            .ok_or_else(|| PromptError::PromptNotFound(prompt_id.to_string()))
    }

    /// Everything up to, but not including, the backend call
    fn prepare(&self, prompt_id: &str, variables: &Variables, provider: &str) -> Result<(Arc<dyn LlmClient>, String)> {
        let record = self.lookup(prompt_id)?;
        let compiled = prompt::compile(&record, variables);
        let backend = self.router.resolve(provider)?;
        log::debug!(
            "Dispatching prompt '{}' ({} chars) to {} [{}]",
            prompt_id,
            compiled.len(),
            backend.name(),
            backend.model()
        );
        Ok((backend, compiled))
    }

    async fn dispatch(
        prompt_id: &str,
        backend: &dyn LlmClient,
        compiled: &str,
        cancel: Option<&CancellationToken>,
        deadline: Option<Duration>,
    ) -> Result<String> {
        let cancelled = async {
            match cancel {
                Some(token) => token.cancelled().await,
                None => pending().await,
            }
        };
        let expired = async {
            match deadline {
                Some(limit) => sleep(limit).await,
                None => pending().await,
            }
        };

        select! {
            result = Self::invoke(backend, compiled) => result,
            _ = cancelled => {
                log::info!("Prompt '{}' cancelled while waiting on {}", prompt_id, backend.name());
                Err(PromptError::Cancelled)
            }
            _ = expired => {
                log::info!("Prompt '{}' exceeded deadline of {:?}", prompt_id, deadline);
                Err(PromptError::Cancelled)
            }
        }
    }

    async fn invoke(backend: &dyn LlmClient, compiled: &str) -> Result<String> {
        backend.complete(compiled).await.map_err(|e| {
            log::warn!("Backend {} failed: {}", backend.name(), e);
            PromptError::BackendInvocationFailed(e)
        })
    }
}
