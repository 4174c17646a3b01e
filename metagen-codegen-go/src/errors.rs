//! Emits the shared errors package: the wire `Error` type, its JSON
//! codec, and the senders the server adapters use for the HTTP error
//! model.

use metagen_core::reporter::Reporter;

use crate::FileSet;
use crate::buffer::BufferBuilder;
use crate::packages::PackagesCalculator;

pub(crate) struct ErrorsEmitter<'a> {
    pub reporter: &'a Reporter,
    pub packages: &'a PackagesCalculator,
    pub files: &'a mut FileSet,
}

impl<'a> ErrorsEmitter<'a> {
    pub fn run(&mut self) -> miette::Result<()> {
        let mut buffer = BufferBuilder::new()
            .reporter(self.reporter)
            .package(self.packages.errors_package())
            .file("errors.go")
            .build()?;
        buffer.import("encoding/json", "");
        buffer.import("fmt", "");
        buffer.import("io", "");
        buffer.import("net/http", "");
        buffer.emit(ERRORS_TEMPLATE, &[]);
        buffer.write(self.files)
    }
}

const ERRORS_TEMPLATE: &str = r#"
// ErrorKind is the name of the type used to represent errors.
const ErrorKind = "Error"

// Error represents the errors returned by the API.
type Error struct {
id *string
reason *string
}

// ID returns the identifier of the error.
func (e *Error) ID() string {
if e != nil && e.id != nil {
return *e.id
}
return ""
}

// GetID returns the identifier of the error and a flag indicating if the
// identifier has a value.
func (e *Error) GetID() (value string, ok bool) {
ok = e != nil && e.id != nil
if ok {
value = *e.id
}
return
}

// Reason returns the reason of the error.
func (e *Error) Reason() string {
if e != nil && e.reason != nil {
return *e.reason
}
return ""
}

// GetReason returns the reason of the error and a flag indicating if the
// reason has a value.
func (e *Error) GetReason() (value string, ok bool) {
ok = e != nil && e.reason != nil
if ok {
value = *e.reason
}
return
}

// Error implements the error interface.
func (e *Error) Error() string {
if e == nil {
return "unknown error"
}
if e.reason != nil {
return *e.reason
}
if e.id != nil {
return fmt.Sprintf("error '%s'", *e.id)
}
return "unknown error"
}

// errorData is the JSON representation of errors.
type errorData struct {
Kind *string `json:"kind,omitempty"`
ID *string `json:"id,omitempty"`
Reason *string `json:"reason,omitempty"`
}

// NewError creates a new error with the given identifier and reason.
func NewError(id string, reason string) *Error {
return &Error{
id: &id,
reason: &reason,
}
}

// UnmarshalError reads an error from the given source, which can be a slice
// of bytes or a reader.
func UnmarshalError(source interface{}) error {
data := new(errorData)
var err error
switch typed := source.(type) {
case []byte:
err = json.Unmarshal(typed, data)
case io.Reader:
err = json.NewDecoder(typed).Decode(data)
default:
err = fmt.Errorf("expected a slice of bytes or a reader, but got %T", source)
}
if err != nil {
return err
}
result := new(Error)
result.id = data.ID
result.reason = data.Reason
return result
}

// MarshalError writes an error to the given writer.
func MarshalError(e *Error, writer io.Writer) error {
data := new(errorData)
kind := ErrorKind
data.Kind = &kind
data.ID = e.id
data.Reason = e.reason
encoder := json.NewEncoder(writer)
return encoder.Encode(data)
}

// SendNotFound writes a 404 response with an empty body. Unknown paths,
// unknown sub-resources, and paths that differ only by a trailing slash all
// land here.
func SendNotFound(w http.ResponseWriter, r *http.Request) {
w.WriteHeader(http.StatusNotFound)
}

// SendMethodNotAllowed writes a 405 response with an empty body.
func SendMethodNotAllowed(w http.ResponseWriter, r *http.Request) {
w.WriteHeader(http.StatusMethodNotAllowed)
}

// SendBadRequest writes a 400 response with a JSON error body describing a
// malformed query parameter or request body.
func SendBadRequest(w http.ResponseWriter, r *http.Request, cause error) {
sendError(w, http.StatusBadRequest, "400", cause)
}

// SendInternalServerError writes a 500 response with a JSON error body
// carrying the reason reported by the server implementation.
func SendInternalServerError(w http.ResponseWriter, r *http.Request, cause error) {
sendError(w, http.StatusInternalServerError, "500", cause)
}

func sendError(w http.ResponseWriter, status int, id string, cause error) {
w.Header().Set("Content-Type", "application/json")
w.WriteHeader(status)
reason := cause.Error()
kind := ErrorKind
data := new(errorData)
data.Kind = &kind
data.ID = &id
data.Reason = &reason
_ = json.NewEncoder(w).Encode(data)
}
"#;
