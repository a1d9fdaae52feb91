#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveLeft,
    MoveRight,
    Jump,
    Fire,
    ChooseRespawn,
    ChooseRestart,
    Quit,
}

const ACTION_COUNT: usize = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    pub const ALL: [InputAction; ACTION_COUNT] = [
        InputAction::MoveLeft,
        InputAction::MoveRight,
        InputAction::Jump,
        InputAction::Fire,
        InputAction::ChooseRespawn,
        InputAction::ChooseRestart,
        InputAction::Quit,
    ];

    const fn index(self) -> usize {
        match self {
            InputAction::MoveLeft => 0,
            InputAction::MoveRight => 1,
            InputAction::Jump => 2,
            InputAction::Fire => 3,
            InputAction::ChooseRespawn => 4,
            InputAction::ChooseRestart => 5,
            InputAction::Quit => 6,
        }
    }
}
