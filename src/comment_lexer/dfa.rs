//! Character-driven automaton over short multi-byte tokens.
//!
//! Every registered token is packed into a `u64` (last byte lowest) together
//! with a mask covering exactly its own length.  The matcher keeps a rolling
//! accumulator of the bytes it has seen since the last reset, so checking a
//! transition is a single masked comparison, with no string compares and no
//! backtracking.  The price is that tokens are limited to [`MAX_TOKEN_LEN`]
//! bytes, which the dialect validation enforces up front.

/// Width of the accumulator in bytes.
pub const MAX_TOKEN_LEN: usize = 8;

/// Stable identifier of a state inside one [`Automaton`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(usize);

impl StateId {
    pub fn index(self) -> usize {
        self.0
    }
}

// ── MaskedToken ───────────────────────────────────────────────────────────────

/// A token packed into an integer plus the mask isolating its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskedToken {
    data: u64,
    mask: u64,
    /// Length in chars, which is what the lexer rewinds by.
    chars: usize,
}

impl MaskedToken {
    /// Pack `text`.  Returns `None` for the empty string (it would match
    /// everything) and for anything longer than [`MAX_TOKEN_LEN`] bytes.
    pub fn new(text: &str) -> Option<Self> {
        let len = text.len();
        if len == 0 || len > MAX_TOKEN_LEN {
            return None;
        }
        Some(Self {
            data: pack(text.as_bytes()),
            mask: u64::MAX >> (64 - 8 * len),
            chars: text.chars().count(),
        })
    }

    /// Compare against the low bytes of the accumulator.
    ///
    /// Starting tokens only ever see a freshly reset accumulator, and ending
    /// tokens match regardless of whatever was accumulated before them.
    pub fn matches(&self, acc: u64) -> bool {
        self.data == acc & self.mask
    }

    pub fn char_len(&self) -> usize {
        self.chars
    }
}

/// Big-endian packing: the last byte ends up in the lowest position.
fn pack(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

// ── State ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Transition {
    token: MaskedToken,
    to: StateId,
}

#[derive(Debug, Clone, Copy)]
struct Nesting {
    descent: MaskedToken,
    ascent: MaskedToken,
}

/// One node of the automaton.
#[derive(Debug, Clone)]
pub struct DfaState<I> {
    id: StateId,
    info: I,
    // Few chars and few transitions per state, so plain vectors beat maps.
    use_chars: Vec<char>,
    transitions: Vec<Transition>,
    nesting: Option<Nesting>,
}

impl<I: Copy> DfaState<I> {
    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn info(&self) -> I {
        self.info
    }

    fn accept_chars(&mut self, token: &str) {
        for c in token.chars() {
            if !self.use_chars.contains(&c) {
                self.use_chars.push(c);
            }
        }
    }

    /// Register `token` as a transition to `to`.  Transitions are tried in
    /// registration order and the first match wins.
    ///
    /// Tokens that cannot be packed are ignored; dialects are validated
    /// before they reach this point.
    pub fn add_transition(&mut self, token: &str, to: StateId) {
        let Some(masked) = MaskedToken::new(token) else {
            return;
        };
        self.accept_chars(token);
        self.transitions.push(Transition { token: masked, to });
    }

    /// Make this state absorb nested `descent`/`ascent` pairs.  Neither token
    /// counts as a state change; the depth is tracked by the matcher.
    pub fn make_recursive(&mut self, descent: &str, ascent: &str) {
        let (Some(d), Some(a)) = (MaskedToken::new(descent), MaskedToken::new(ascent)) else {
            return;
        };
        self.accept_chars(descent);
        self.accept_chars(ascent);
        self.nesting = Some(Nesting {
            descent: d,
            ascent: a,
        });
    }

    #[cfg(test)]
    pub(crate) fn is_recursive(&self) -> bool {
        self.nesting.is_some()
    }
}

// ── Automaton ─────────────────────────────────────────────────────────────────

/// The immutable state graph.  Compiled once per dialect and shared by every
/// [`Matcher`] that runs over it.
#[derive(Debug, Clone)]
pub struct Automaton<I> {
    states: Vec<DfaState<I>>,
}

impl<I: Copy> Default for Automaton<I> {
    fn default() -> Self {
        Self { states: Vec::new() }
    }
}

impl<I: Copy> Automaton<I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a state tagged with `info`.  The first state added is the start
    /// state.
    pub fn add_state(&mut self, info: I) -> StateId {
        let id = StateId(self.states.len());
        self.states.push(DfaState {
            id,
            info,
            use_chars: Vec::new(),
            transitions: Vec::new(),
            nesting: None,
        });
        id
    }

    pub fn state(&self, id: StateId) -> &DfaState<I> {
        &self.states[id.0]
    }

    pub fn state_mut(&mut self, id: StateId) -> &mut DfaState<I> {
        &mut self.states[id.0]
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.states.len()
    }

    /// Start a run at the first state.
    pub fn matcher(&self) -> Matcher<'_, I> {
        Matcher {
            automaton: self,
            current: StateId(0),
            token: 0,
            depth: 0,
        }
    }
}

// ── Matcher ───────────────────────────────────────────────────────────────────

/// Mutable run over an [`Automaton`].
#[derive(Debug, Clone)]
pub struct Matcher<'a, I> {
    automaton: &'a Automaton<I>,
    current: StateId,
    token: u64,
    depth: usize,
}

impl<I: Copy> Matcher<'_, I> {
    pub fn current(&self) -> &DfaState<I> {
        self.automaton.state(self.current)
    }

    /// Current nesting depth of the recursive state being traversed.
    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    /// Feed one character.  Returns the length in chars of the token that
    /// caused a state change, or `None` if the state stayed the same.
    pub fn process(&mut self, c: char) -> Option<usize> {
        let state = self.automaton.state(self.current);
        if !state.use_chars.contains(&c) {
            self.token = 0;
            return None;
        }

        let mut buf = [0u8; 4];
        let bytes = c.encode_utf8(&mut buf).as_bytes();
        self.token = (self.token << (8 * bytes.len())) | pack(bytes);

        if let Some(nesting) = &state.nesting {
            if nesting.descent.matches(self.token) {
                self.depth += 1;
                self.token = 0;
                return None;
            }
            if self.depth != 0 && nesting.ascent.matches(self.token) {
                self.depth -= 1;
                self.token = 0;
                return None;
            }
        }

        let hit = state
            .transitions
            .iter()
            .find(|t| t.token.matches(self.token))?;
        self.current = hit.to;
        self.token = 0;
        Some(hit.token.char_len())
    }

    /// Forget the accumulated bytes, as if an unrelated char was seen.
    pub(crate) fn reset(&mut self) {
        self.token = 0;
    }

    /// Jump to `id` and reset the accumulator.
    pub fn force_state(&mut self, id: StateId) {
        self.current = id;
        self.token = 0;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
