use cairn_lifecycle::{HookContext, HookDecision, LifecycleHook, LifecycleResult, Operation};
use tracing::debug;

use crate::resolver::SlugResolver;
use crate::route::ObjectRoute;
use crate::slug::validate_slug;

/// Lifecycle hook for [`ObjectRoute`].
///
/// On create it vetoes routes without a usable slug, resolves slug
/// collisions, and stamps both dates. On update it stamps both dates again,
/// so `creation_date` tracks the latest write.
#[derive(Clone, Copy, Debug, Default)]
pub struct RouteHook;

impl LifecycleHook<ObjectRoute> for RouteHook {
    fn name(&self) -> &str {
        "routes"
    }

    fn pre(
        &self,
        route: &mut ObjectRoute,
        ctx: &HookContext<'_>,
    ) -> LifecycleResult<HookDecision> {
        match ctx.operation {
            Operation::Create => {
                if let Err(e) = validate_slug(route.slug()) {
                    return Ok(HookDecision::veto(e.to_string()));
                }
                let collisions = SlugResolver::new(ctx.store).generate_unique_slug(route)?;
                if collisions > 0 {
                    debug!(slug = %route.slug(), collisions, "route slug suffixed");
                }
            }
            Operation::Update => {}
            Operation::Delete | Operation::Restore => return Ok(HookDecision::Proceed),
        }
        let now = ctx.now();
        route.creation_date = Some(now);
        route.last_modification_date = Some(now);
        Ok(HookDecision::Proceed)
    }
}
