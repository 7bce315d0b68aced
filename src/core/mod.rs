// ─── JavaGuard Core ───
// Finds a Java runtime that can run a given application version.
//
// Architecture:
//   core/
//     error    : Central error type
//     http     : Shared HTTP client builder
//     settings : Persisted tuning + environment snapshot
//     java/
//       version  : Runtime version grammars + target versions
//       platform : Per-OS executable layout
//       compat   : Target → accepted runtime table
//       discovery: Candidate sources + dedupe
//       registry : Windows JavaSoft keys
//       probe    : Spawn-and-parse validation
//       rank     : Preference ordering
//       resolver : Discover → validate → rank pipeline
//       remote   : Latest downloadable JDK lookup

pub mod error;
pub mod http;
pub mod java;
pub mod settings;
