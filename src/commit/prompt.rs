//! Instruction text sent to every backend alongside the diff.

/// Opening tag the model must wrap its answer in.
pub const COMMIT_START_TAG: &str = "<Commit>";

/// Closing tag the model must wrap its answer in.
pub const COMMIT_END_TAG: &str = "</Commit>";

/// System-role instruction: Conventional Commits rules plus the output protocol.
///
/// The diff is always sent as a separate user message.
pub const COMMIT_INSTRUCTIONS: &str = r#"You are generating a Git commit message that strictly follows the Conventional Commits specification.

## Format
`<type>[optional scope][!]: <description>`

## Type (required)
One of:
- `init`: the initial commit of a project
- `feat`: a new feature
- `fix`: a bug fix
- `build`: build system or external dependency changes (cargo, npm, make)
- `chore`: housekeeping that touches neither source nor tests
- `ci`: CI configuration and scripts
- `docs`: documentation only
- `style`: formatting and whitespace, no change in meaning
- `refactor`: neither fixes a bug nor adds a feature
- `perf`: improves performance
- `test`: adds or corrects tests

## Scope (optional)
- A noun naming the part of the codebase affected, in parentheses right after the type.
- Examples: `auth`, `ui-kit`, `parser`, `api`.

## Breaking change marker (optional)
- Put `!` immediately before the colon when the change is not backward compatible.
- Examples: `feat!: ...`, `refactor(auth)!: ...`

## Description (required)
- A concise summary in the imperative, present tense ("add", not "added").
- Start with a lowercase letter.
- Do not end with a period.

## Branch hints
- `feature/*` branches usually mean `feat`.
- `patch/*` and `hotfix/*` branches usually mean `fix`.
- `break/*` branches may carry the `!` marker if the change really breaks compatibility.

## Examples
- feat(auth): implement user logout
- fix(ui-kit): correct button alignment on mobile
- chore: update build dependencies
- refactor(api)!: overhaul endpoint structure for v2

## Output
Reply with the commit message wrapped in tags, on a single line:
<Commit>{commit message}</Commit>

- The message must be a single line.
- The <Commit> and </Commit> tags are mandatory.
- Base the message only on the git diff you are given.
"#;
