//! The built-in walk-path reference printed by `-g`.

const WALK_SYNTAX: &str = r#"
  * Walk-path syntax:

A walk-path is a sequence of lexemes instructing how to traverse the input
JSON; it selects one or many elements. There are two lexeme families:
 a) offset lexemes - subscript/address JSON nodes
 b) search lexemes - search down (or across) the JSON tree

a. Offset lexemes are enclosed in square brackets; the meaning depends on
   the body: '[]', '[text]', '[n]', '[-n]', '[^n]', '[+n]', '[N:N]'
   - []: empty offset, matches an empty label: { "": "empty label" }
   - [text]: selects the child behind the label, e.g. '[number]' selects
     3.14 in { "number": 3.14 }
   - [n]: zero-based numerical offset, selects the n-th child of an
     iterable (an array or an object)
   - [-n]: backs off n levels up the tree from the given position, e.g.
     '[0][0][-2]' descends twice and ends up back at the root
   - [^n]: like [-n] but descending from the root: '[0][1][2][^2]' equals
     '[0][1]'; n cannot be negative here, a leading '+' is tolerated
   - [+n]: iterates over all children starting with the n-th one, making
     the path a multi-match walk
   - [N:N]: a python-style range over the children; signs and indices are
     optional: '[:]', '[1:]', '[-2:]', '[:3]', '[:-3]', '[+4:-5]' are all
     valid; '[+0]' and '[:]' select the same elements
   An offset body violating the numeric notations is taken as a textual
   label: '[ 1]' and '[1 ]' address the labels " 1" and "1 ".

b. Search lexemes come as '<txt>S N' (recursive, the whole subtree) or
   '>txt<S N' (non-recursive, immediate children only), where S is an
   optional one-letter suffix and N an optional quantifier.
   Suffixes [rRlLdDbnaoijwe] alter what is matched:
     r: exact match among string values (the default)
     R: like r, but the body is a regex
     l: exact match among object labels
     L: like l, but the body is a regex
     d: match a number
     D: like d, the body being a regex over the number's textual form
     b: match booleans; spell the body 'true', 'false' or 'any'
     n: match nulls (the body is ignored)
     a: match any atomic value (string, number, boolean, null)
     o: match any object
     i: match any array
     j: match the body parsed as JSON, by structural equality
     w: wide match - any JSON value
     e: end-node match - atomics, {} and []
   Quantifiers select among the found matches (zero-based):
     n    - the n-th match only, e.g. '<text>3'
     +n   - the n-th match and all following ones
     n:n  - a half-open range of matches; indices cannot go negative
   Empty bodies '<>', '><' are only allowed with the suffixes r, l, n, a.

A closing bracket inside a body must be escaped: '[case[0\]]' addresses the
label "case[0]", '<tag<a\>>' searches for "tag<a>".

Spaces between lexemes are ignored; spaces inside offset bodies are
meaningful (see the textual-label rule above).

To match a value only when it hangs under a specific label, prefix the
search with that label: '[parent]:<^John>R' matches values under the label
"parent" only; the suffixes l and L are not applicable there.
"#;

const USAGE_NOTES: &str = r#"
  * Usage notes:

multiple -w usage:
 - with -n the walks are processed sequentially in the given order;
   otherwise results are grouped by relevance and interleaved

options -j and -l:
 - -j wraps walked elements into a JSON array; together with -l the
   elements are grouped into relevant objects by their labels; -jj wraps
   into an object instead (elements without labels are dropped); these
   options only shape walked output and are ignored with -i, -u, -s, -p

mutually exclusive operations:
 - -c, -i, -u, -s, -p are picked in that priority order when given
   together; the exception is -p combined with -i/-u (see below)

options -i, -u:
 - the parameter is tried as a file first, then as a JSON literal, then as
   a walk-path over the input; a walk-path parameter makes the operation a
   copy from the walked source
 - with -e preceding, the parameter is a shell command line terminated by
   \; - every occurrence of {} (interpolated without outer quotes for
   strings) or {{}} (raw) is substituted with the walked entry; the
   command output must be valid JSON, otherwise it is taken as a string
 - trailing -i/-u options after the \; are walk-paths whose matches feed
   the command one by one

option -m with -i, -u:
 - -i: by default inserts only into iterables; with -m the source is
   merged with destinations of any kind
 - -u: overwrites by default; with -m the source is merged element-wise,
   clashing scalars being overwritten
 * insert (-i) without merge:
   to \ from  |        [3,4]        |     {"a":3,"c":4}     |      "a":3,"c":4      |     3
 -------------+---------------------+-----------------------+-----------------------+-------------
    [1,2]     |     [1,2,[3,4]]     |  [1,2,{"a":3,"c":4}]  | [1,2,{"a":3},{"c":4}] |  [1,2,3]
 {"a":1,"b":2}|    {"a":1,"b":2}    |  {"a":1,"b":2,"c":4}  |  {"a":1,"b":2,"c":4}  |{"a":1,"b":2}
     "a"      |         "a"         |          "a"          |          "a"          |    "a"
 * insert (-i) with merge (-m):
   to \ from  |        [3,4]        |     {"a":3,"c":4}     |      "a":3,"c":4      |     3
 -------------+---------------------+-----------------------+-----------------------+-------------
    [1,2]     |      [1,2,3,4]      |       [1,2,3,4]       |       [1,2,3,4]       |  [1,2,3]
 {"a":1,"b":2}|{"a":[1,3],"b":[2,4]}|{"a":[1,3],"b":2,"c":4}|{"a":[1,3],"b":2,"c":4}|{"a":1,"b":2}
     "a"      |      ["a",3,4]      |       ["a",3,4]       |       ["a",3,4]       |  ["a",3]
 * update (-u) without merge:
   to \ from  |        [3,4]        |     {"a":3,"c":4}     |         "a":3         |     3
 -------------+---------------------+-----------------------+-----------------------+-------------
    any       |        [3,4]        |     {"a":3,"c":4}     |           3           |     3
 * update (-u) with merge (-m):
   to \ from  |        [3,4]        |     {"a":3,"c":4}     |         "a":3         |     3
 -------------+---------------------+-----------------------+-----------------------+-------------
    [1,2]     |        [3,4]        |         [3,4]         |         [3,2]         |   [3,2]
 {"a":1,"b":2}|    {"a":3,"b":4}    |  {"a":3,"b":2,"c":4}  |     {"a":3,"b":2}     |{"a":3,"b":2}
     "a"      |        [3,4]        |     {"a":3,"c":4}     |        {"a":3}        |     3

option -p with -i, -u:
 - when the -i/-u parameter is a walk-path, adding -p turns the operation
   into a move: the walked sources are purged afterwards; -pp instead
   purges everything but the destination locations (-w)

options -x and -y:
 - every -y is prepended with the nearest preceding -x to form a -w:
   -x1 -yA -yB -x2 is equivalent to -w1A -w1B -w2; a -x with no following
   -y becomes a -w of its own

templates (-T):
 - {} interpolates the current walked value (strings lose their outer
   quotes), {{}} interpolates the raw JSON; {$path} is the walked path
   joined with '_', {$PATH} the path as a JSON array; several -T options
   cycle over the walked matches
"#;

const EXAMPLES: &str = r#"
  * Examples:

 Consider this source JSON (stored in the file example.json):
    {
        "Relation": [
            {
                "parent": "John Smith",
                "age": 31,
                "city": "New York",
                "children": [ "Sophia", "Olivia" ]
            },
            {
                "parent": "Anna Johnson",
                "age": 28,
                "city": "Chicago",
                "children": [ "John" ]
            }
        ]
    }

- select the "children" node of the first record:
    jtw -w '[Relation][0][children]' example.json
    [
       "Sophia",
       "Olivia"
    ]

- select all children of all records, plus the parents, interleaved:
    jtw -w'[Relation][+0][parent]' -w'[Relation][+0][children][+0]' example.json
    "John Smith"
    "Sophia"
    "Olivia"
    "Anna Johnson"
    "John"
  the same, more succinctly:
    jtw -x'[Relation][+0]' -y'[parent]' -y'[children][+0]' example.json

- select all children of the record whose parent's name starts with "John",
  pinning the match to the label "parent" to avoid false positives:
    jtw -w '[parent]:<^John>R[-1][children][+0]' example.json
    "Sophia"
    "Olivia"

- insert a child into that record, rewriting the file in place:
    jtw -f -w'[parent]:<^John>R[-1][children]' -i'"James"' example.json

- replace a value anywhere in the tree:
    jtw -w '<John Smith>' -u '"Jane Smith"' example.json

- wrap walked results back into JSON:
    jtw -w'[Relation][+0][parent]' -j example.json
    [
       "John Smith",
       "Anna Johnson"
    ]
  with -l the labeled entries group into relevant objects:
    jtw -w'[Relation][+0][parent]' -jl example.json
    [
       {
          "parent": [
             "John Smith",
             "Anna Johnson"
          ]
       }
    ]

- pipe each walked entry through a shell command (-e), here capitalizing
  all parent names:
    jtw -w'[Relation][+0][parent]' -eu echo {} \| tr "[:lower:]" "[:upper:]" \; example.json

- a destination walked by a label search (suffixes l, L) addresses the
  label itself; updating it renames the entry:
    jtw -w'<parent>l' -u'"father"' example.json
"#;

pub fn print_guide() {
  println!("{WALK_SYNTAX}");
  println!("{USAGE_NOTES}");
  println!("{EXAMPLES}");
}
