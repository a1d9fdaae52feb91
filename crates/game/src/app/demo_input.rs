use engine::{InputAction, InputSnapshot, InputSource};

const JUMP_PERIOD_TICKS: u64 = 50;
const JUMP_HOLD_TICKS: u64 = 12;
const FIRE_PHASE_TICKS: u64 = 120;
const RESPAWN_PERIOD_TICKS: u64 = 90;
const RESTART_PERIOD_TICKS: u64 = 900;

/// Stand-in for a player: runs right, hops on a fixed rhythm, fires in
/// bursts, and answers the death prompt. Respawn is chosen most of the time,
/// restart once every `RESTART_PERIOD_TICKS`.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DemoInput;

impl InputSource for DemoInput {
    fn snapshot_for_tick(&mut self, tick: u64) -> InputSnapshot {
        let jump_phase = tick % JUMP_PERIOD_TICKS;
        let choose_restart = tick % RESTART_PERIOD_TICKS == RESTART_PERIOD_TICKS - 1;
        let choose_respawn =
            !choose_restart && tick % RESPAWN_PERIOD_TICKS == RESPAWN_PERIOD_TICKS / 2;

        InputSnapshot::empty()
            .with_action_down(InputAction::MoveRight, true)
            .with_action_pressed(InputAction::Jump, jump_phase == 0)
            .with_action_down(InputAction::Jump, jump_phase < JUMP_HOLD_TICKS)
            .with_action_down(InputAction::Fire, (tick / FIRE_PHASE_TICKS) % 2 == 1)
            .with_action_pressed(InputAction::ChooseRespawn, choose_respawn)
            .with_action_pressed(InputAction::ChooseRestart, choose_restart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_input_always_runs_right() {
        let mut input = DemoInput;
        for tick in [0, 7, 133, 899] {
            assert!(input.snapshot_for_tick(tick).is_down(InputAction::MoveRight));
        }
    }

    #[test]
    fn demo_input_jump_press_is_a_single_tick_edge() {
        let mut input = DemoInput;
        assert!(input.snapshot_for_tick(50).was_pressed(InputAction::Jump));
        assert!(!input.snapshot_for_tick(51).was_pressed(InputAction::Jump));
        assert!(input.snapshot_for_tick(51).is_down(InputAction::Jump));
        assert!(!input.snapshot_for_tick(62).is_down(InputAction::Jump));
    }

    #[test]
    fn demo_input_never_chooses_both_prompt_options() {
        let mut input = DemoInput;
        for tick in 0..2_000 {
            let snapshot = input.snapshot_for_tick(tick);
            assert!(
                !(snapshot.was_pressed(InputAction::ChooseRespawn)
                    && snapshot.was_pressed(InputAction::ChooseRestart))
            );
        }
        assert!(input
            .snapshot_for_tick(RESTART_PERIOD_TICKS - 1)
            .was_pressed(InputAction::ChooseRestart));
    }

    #[test]
    fn demo_input_never_requests_quit() {
        let mut input = DemoInput;
        assert!((0..1_000).all(|tick| !input.snapshot_for_tick(tick).quit_requested()));
    }
}
