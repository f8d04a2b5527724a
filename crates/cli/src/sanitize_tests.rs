// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    plain              = { "ls -la", "ls -la" },
    semicolon          = { "echo foo; rm -rf /", "echo foo" },
    and_list           = { "make && make install", "make " },
    background         = { "sleep 1 &", "sleep 1 " },
    pipe               = { "ls *.rs | wc -l", "ls *.rs " },
    backtick           = { "ls `pwd`", "ls " },
    redirect_spaced    = { "cat foo > out", "cat foo " },
    redirect_glued     = { "cat foo>out", "cat " },
    redirect_fd        = { "grep x * 2>/dev/null", "grep x * " },
    input_redirect     = { "sort <in", "sort " },
    variable           = { "ls $HOME/src", "ls /src" },
    braced_variable    = { "ls ${dir}/x", "ls /x" },
    command_subst      = { "ls $(echo $(pwd))/x", "ls /x" },
    special_parameter  = { "echo $? $1", "echo  " },
    history_last       = { "echo !!", "echo " },
    history_modifier   = { "ls !$:h/*", "ls /*" },
    history_search     = { "!?make? -j4", " -j4" },
    bang_at_end        = { "echo hi!", "echo hi!" },
    bang_before_space  = { "echo ! foo", "echo ! foo" },
    open_single_quote  = { "ls 'unterminated", "ls 'unterminated'" },
    open_double_quote  = { "ls \"a b", "ls \"a b\"" },
    quoted_separator   = { "ls 'a;b'", "ls 'a;b'" },
    variable_in_quotes = { "echo \"$HOME\"", "echo \"\"" },
    escaped_quote      = { r"ls 'it'\''s'", r"ls 'it'\''s'" },
    trailing_backslash = { r"ls foo\", "ls foo" },
    extglob            = { "ls @(a|b)", "ls @(a|b)" },
    open_extglob       = { "ls +(a|b", "ls +(a|b)" },
    negated_extglob    = { "ls !(*.o)", "ls !(*.o)" },
    subshell           = { "ls (foo)", "ls " },
    stray_close_paren  = { "ls a)", "ls a" },
)]
fn sanitize(input: &str, expected: &str) {
    assert_eq!(sanitize_command(input), expected);
}

#[test]
fn redirect_inside_extglob_drops_the_open_group() {
    assert_eq!(sanitize_command("ls x @(a|b>c"), "ls x ");
}

#[test]
fn mask_escapes_single_quotes() {
    assert_eq!(sanitize_mask("it's"), r"it'\''s");
    assert_eq!(sanitize_mask("*.rs"), "*.rs");
}

#[test]
fn shell_quote_wraps_one_word() {
    assert_eq!(shell_quote("/tmp/a b"), "'/tmp/a b'");
    assert_eq!(shell_quote("don't"), r"'don'\''t'");
}
