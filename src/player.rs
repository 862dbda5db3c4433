use std::time::Duration;

use glam::Vec3;

use crate::input::{InputState, KeyCode};
use crate::scene::PlayerConfig;

/// The cylinder the user walks around the ground plane with WASD.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub position: Vec3,
    pub speed: f32,
    pub radius: f32,
    pub height: f32,
}

impl Player {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            position: config.position,
            speed: config.speed,
            radius: config.radius,
            height: config.height,
        }
    }

    /// Moves the player by one fixed step. W/S move along -z/+z, A/D along -x/+x.
    pub fn advance(&mut self, input: &InputState, step: Duration) {
        let direction = movement_direction(input);
        if direction == Vec3::ZERO {
            return;
        }
        self.position += direction * self.speed * step.as_secs_f32();
    }
}

/// Unnormalized direction from the held movement keys; opposite keys cancel out.
pub fn movement_direction(input: &InputState) -> Vec3 {
    let axis = |negative: KeyCode, positive: KeyCode| {
        let mut value = 0.0;
        if input.is_pressed(negative) {
            value -= 1.0;
        }
        if input.is_pressed(positive) {
            value += 1.0;
        }
        value
    };
    Vec3::new(axis(KeyCode::A, KeyCode::D), 0.0, axis(KeyCode::W, KeyCode::S))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn default_speed_moves_a_tenth_per_tick() {
        let input = InputState::new();
        input.press_key(KeyCode::W);
        let mut player = Player::new(&PlayerConfig::default());
        player.advance(&input, Duration::from_secs_f64(1.0 / 60.0));
        assert!(approx(player.position, Vec3::new(0.0, 0.0, -0.1)));
    }

    #[test]
    fn diagonal_and_opposing_keys() {
        let input = InputState::new();
        input.press_key(KeyCode::S);
        input.press_key(KeyCode::D);
        assert_eq!(movement_direction(&input), Vec3::new(1.0, 0.0, 1.0));

        input.press_key(KeyCode::A);
        assert_eq!(movement_direction(&input), Vec3::new(0.0, 0.0, 1.0));

        input.press_key(KeyCode::W);
        assert_eq!(movement_direction(&input), Vec3::ZERO);
    }

    #[test]
    fn idle_player_stays_put() {
        let input = InputState::new();
        let mut player = Player::new(&PlayerConfig::default());
        player.advance(&input, Duration::from_millis(100));
        assert_eq!(player.position, Vec3::ZERO);
    }
}
