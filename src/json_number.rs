//! Internal module for scanning / validating JSON numbers

/// Scans a JSON number starting at `start` in `bytes`.
///
/// Returns `None` if the bytes at `start` do not form a valid JSON number and
/// `Some(end)` with the exclusive end index otherwise. Trailing bytes which
/// could be part of a number (e.g. the second `0` in `01`) make the number
/// invalid; any other trailing byte ends the number.
pub(crate) fn scan_json_number(bytes: &[u8], start: usize) -> Option<usize> {
    #[derive(PartialEq, Clone, Copy)]
    enum State {
        Start,
        Minus,
        IntZero,
        IntNonZero,
        DecimalPoint,
        DecimalDigit,
        ExpE,
        ExpSign,
        ExpDigit,
    }

    let mut state = State::Start;
    let mut pos = start;

    while let Some(&byte) = bytes.get(pos) {
        let next_state = match (state, byte) {
            (State::Start, b'-') => State::Minus,
            (State::ExpE, b'-' | b'+') => State::ExpSign,

            (State::Start | State::Minus, b'0') => State::IntZero,
            (State::Start | State::Minus | State::IntNonZero, b'0'..=b'9') => State::IntNonZero,
            (State::DecimalPoint | State::DecimalDigit, b'0'..=b'9') => State::DecimalDigit,
            (State::ExpE | State::ExpSign | State::ExpDigit, b'0'..=b'9') => State::ExpDigit,

            (State::IntZero | State::IntNonZero, b'.') => State::DecimalPoint,
            (State::IntZero | State::IntNonZero | State::DecimalDigit, b'e' | b'E') => State::ExpE,

            // Number char at a position where it is not allowed, e.g. "01" or "1.2.3"
            (_, b'-' | b'+' | b'.' | b'e' | b'E' | b'0'..=b'9') => return None,
            // Any other byte ends the number
            _ => break,
        };
        state = next_state;
        pos += 1;
    }

    match state {
        State::IntZero | State::IntNonZero | State::DecimalDigit | State::ExpDigit => Some(pos),
        _ => None,
    }
}

pub(crate) fn is_valid_json_number(value: &str) -> bool {
    scan_json_number(value.as_bytes(), 0) == Some(value.len())
}
