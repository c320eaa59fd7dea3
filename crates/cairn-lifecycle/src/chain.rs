use crate::error::LifecycleResult;
use crate::hook::{HookContext, HookDecision, HookFailure, LifecycleHook};

/// Ordered list of hooks attached to one model type.
pub struct HookChain<T> {
    hooks: Vec<Box<dyn LifecycleHook<T>>>,
}

impl<T> HookChain<T> {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Append a hook to the end of the chain.
    pub fn push(&mut self, hook: Box<dyn LifecycleHook<T>>) {
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Hook names in run order.
    pub fn names(&self) -> Vec<&str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    /// Run every `pre` hook in order.
    ///
    /// Fail-fast: the first veto stops the chain and is returned. Hook
    /// errors propagate.
    pub fn run_pre(
        &self,
        target: &mut T,
        ctx: &HookContext<'_>,
    ) -> LifecycleResult<Option<HookFailure>> {
        for hook in &self.hooks {
            if let HookDecision::Veto { reason } = hook.pre(target, ctx)? {
                return Ok(Some(HookFailure {
                    hook: hook.name().to_string(),
                    reason,
                }));
            }
        }
        Ok(None)
    }

    /// Run every `post` hook and collect the ones that vetoed or failed.
    ///
    /// A failing hook does not stop the remaining ones.
    pub fn run_post(&self, target: &T, ctx: &HookContext<'_>) -> Vec<HookFailure> {
        let mut failures = Vec::new();
        for hook in &self.hooks {
            let reason = match hook.post(target, ctx) {
                Ok(HookDecision::Proceed) => continue,
                Ok(HookDecision::Veto { reason }) => reason,
                Err(e) => e.to_string(),
            };
            failures.push(HookFailure {
                hook: hook.name().to_string(),
                reason,
            });
        }
        failures
    }
}

impl<T> Default for HookChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for HookChain<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LifecycleError;
    use crate::hook::Operation;
    use cairn_store::InMemoryObjectStore;
    use cairn_types::SystemClock;
    use std::sync::Mutex;

    type Log = std::sync::Arc<Mutex<Vec<String>>>;

    struct Recorder {
        name: &'static str,
        log: Log,
        pre: HookDecision,
        post_fails: bool,
    }

    impl LifecycleHook<u32> for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn pre(&self, target: &mut u32, _ctx: &HookContext<'_>) -> LifecycleResult<HookDecision> {
            *target += 1;
            self.log.lock().unwrap().push(format!("pre:{}", self.name));
            Ok(self.pre.clone())
        }

        fn post(&self, _target: &u32, _ctx: &HookContext<'_>) -> LifecycleResult<HookDecision> {
            self.log.lock().unwrap().push(format!("post:{}", self.name));
            if self.post_fails {
                return Err(LifecycleError::hook(self.name, "boom"));
            }
            Ok(HookDecision::Proceed)
        }
    }

    fn recorder(
        name: &'static str,
        log: &Log,
        pre: HookDecision,
        post_fails: bool,
    ) -> Box<Recorder> {
        Box::new(Recorder {
            name,
            log: log.clone(),
            pre,
            post_fails,
        })
    }

    fn with_ctx<R>(f: impl FnOnce(&HookContext<'_>) -> R) -> R {
        let store = InMemoryObjectStore::new();
        let ctx = HookContext::new(Operation::Update, &SystemClock, &store);
        f(&ctx)
    }

    #[test]
    fn pre_runs_in_order_and_stops_at_first_veto() {
        let log = Log::default();
        let mut chain: HookChain<u32> = HookChain::new();
        chain.push(recorder("a", &log, HookDecision::Proceed, false));
        chain.push(recorder("b", &log, HookDecision::veto("nope"), false));
        chain.push(recorder("c", &log, HookDecision::Proceed, false));

        let mut target = 0u32;
        let veto = with_ctx(|ctx| chain.run_pre(&mut target, ctx)).unwrap();
        assert_eq!(
            veto,
            Some(HookFailure {
                hook: "b".into(),
                reason: "nope".into()
            })
        );
        assert_eq!(target, 2);
        assert_eq!(*log.lock().unwrap(), vec!["pre:a", "pre:b"]);
    }

    #[test]
    fn post_collects_all_failures() {
        let log = Log::default();
        let mut chain: HookChain<u32> = HookChain::new();
        chain.push(recorder("a", &log, HookDecision::Proceed, true));
        chain.push(recorder("b", &log, HookDecision::Proceed, false));
        chain.push(recorder("c", &log, HookDecision::Proceed, true));

        let failures = with_ctx(|ctx| chain.run_post(&0, ctx));
        let names: Vec<_> = failures.iter().map(|f| f.hook.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[test]
    fn names_follow_registration_order() {
        let log = Log::default();
        let mut chain: HookChain<u32> = HookChain::new();
        assert!(chain.is_empty());
        chain.push(recorder("first", &log, HookDecision::Proceed, false));
        chain.push(recorder("second", &log, HookDecision::Proceed, false));
        assert_eq!(chain.names(), vec!["first", "second"]);
        assert_eq!(chain.len(), 2);
    }
}
