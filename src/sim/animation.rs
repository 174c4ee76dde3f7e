//! Cloud drift

use super::state::Cloud;
use crate::consts::{CLOUD_WRAP_MARGIN, SCREEN_WIDTH};

/// Distance a cloud travels between two visits to the same screen x
pub const WRAP_SPAN: f32 = SCREEN_WIDTH + 2.0 * CLOUD_WRAP_MARGIN;

/// Advance every cloud by one tick of its velocity.
///
/// Clouds leaving past the right margin re-enter from the left; the
/// overshoot is carried over so repeated wraps never lose distance.
pub fn advance(clouds: &mut [Cloud]) {
    for cloud in clouds.iter_mut() {
        cloud.pos.x += cloud.velocity;
        if cloud.pos.x > SCREEN_WIDTH + CLOUD_WRAP_MARGIN {
            cloud.pos.x -= WRAP_SPAN;
        }
    }
}
