// SPDX-License-Identifier: MIT

//! End-to-end coverage driving the real `kestrel` binary, for behavior
//! that only exists at the boundary between the CLI and the supervisor
//! (flag parsing, process exit codes, the on-disk layout).

mod boot;
