// harness/gate.rs - Conditional suite registration
//
// describe_if(condition) hands back a registration function: the real one
// when the condition holds, a no-op otherwise. The condition is a plain bool,
// so it is decided once, before any case of the suite is registered.

use super::{Registry, Suite};

/// Signature shared by [`describe`] and the no-op returned by [`describe_if`]
pub type DescribeFn<C> = fn(&mut Registry<C>, &str, &mut dyn FnMut(&mut Suite<C>));

/// Register `name` and let `body` declare its cases
pub fn describe<C: Clone + 'static>(
    registry: &mut Registry<C>,
    name: &str,
    body: &mut dyn FnMut(&mut Suite<C>),
) {
    registry.describe(name, |suite| body(suite));
}

fn skip<C: Clone + 'static>(
    _registry: &mut Registry<C>,
    name: &str,
    _body: &mut dyn FnMut(&mut Suite<C>),
) {
    tracing::debug!(suite = name, "suite not registered");
}

pub fn describe_if<C: Clone + 'static>(condition: bool) -> DescribeFn<C> {
    if condition {
        describe::<C>
    } else {
        skip::<C>
    }
}
