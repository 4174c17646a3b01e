//! Emits the shared helpers package: the query-parameter parsing
//! functions the server adapters call into.

use metagen_core::reporter::Reporter;

use crate::FileSet;
use crate::buffer::BufferBuilder;
use crate::packages::PackagesCalculator;

pub(crate) struct HelpersEmitter<'a> {
    pub reporter: &'a Reporter,
    pub packages: &'a PackagesCalculator,
    pub files: &'a mut FileSet,
}

impl<'a> HelpersEmitter<'a> {
    pub fn run(&mut self) -> miette::Result<()> {
        let mut buffer = BufferBuilder::new()
            .reporter(self.reporter)
            .package(self.packages.helpers_package())
            .file("helpers.go")
            .build()?;
        buffer.import("fmt", "");
        buffer.import("net/url", "");
        buffer.import("strconv", "");
        buffer.import("time", "");
        buffer.emit(HELPERS_TEMPLATE, &[]);
        buffer.write(self.files)
    }
}

const HELPERS_TEMPLATE: &str = r#"
// ParseBoolean parses a boolean query parameter. It returns nil when the
// parameter isn't present.
func ParseBoolean(query url.Values, name string) (*bool, error) {
text := query.Get(name)
if text == "" {
return nil, nil
}
value, err := strconv.ParseBool(text)
if err != nil {
return nil, fmt.Errorf("value '%s' of parameter '%s' isn't a valid boolean", text, name)
}
return &value, nil
}

// ParseInteger parses an integer query parameter. It returns nil when the
// parameter isn't present.
func ParseInteger(query url.Values, name string) (*int, error) {
text := query.Get(name)
if text == "" {
return nil, nil
}
value, err := strconv.Atoi(text)
if err != nil {
return nil, fmt.Errorf("value '%s' of parameter '%s' isn't a valid integer", text, name)
}
return &value, nil
}

// ParseLong parses a long integer query parameter. It returns nil when the
// parameter isn't present.
func ParseLong(query url.Values, name string) (*int64, error) {
text := query.Get(name)
if text == "" {
return nil, nil
}
value, err := strconv.ParseInt(text, 10, 64)
if err != nil {
return nil, fmt.Errorf("value '%s' of parameter '%s' isn't a valid long integer", text, name)
}
return &value, nil
}

// ParseFloat parses a floating point query parameter. It returns nil when
// the parameter isn't present.
func ParseFloat(query url.Values, name string) (*float64, error) {
text := query.Get(name)
if text == "" {
return nil, nil
}
value, err := strconv.ParseFloat(text, 64)
if err != nil {
return nil, fmt.Errorf("value '%s' of parameter '%s' isn't a valid float", text, name)
}
return &value, nil
}

// ParseString parses a string query parameter. It returns nil when the
// parameter isn't present.
func ParseString(query url.Values, name string) (*string, error) {
text := query.Get(name)
if text == "" {
return nil, nil
}
return &text, nil
}

// ParseDate parses a RFC3339 date query parameter. It returns nil when the
// parameter isn't present.
func ParseDate(query url.Values, name string) (*time.Time, error) {
text := query.Get(name)
if text == "" {
return nil, nil
}
value, err := time.Parse(time.RFC3339, text)
if err != nil {
return nil, fmt.Errorf("value '%s' of parameter '%s' isn't a valid date", text, name)
}
return &value, nil
}
"#;
