//! Builtin function registry.
//!
//! Static catalog of the functions available inside LG expressions. Entries
//! are kept in declaration order; completion relies on that order being
//! stable. Name lookup goes through an index built on first use.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

/// Kind of value a builtin function returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnType {
    Boolean,
    Number,
    Object,
    String,
    Array,
}

impl ReturnType {
    pub fn name(self) -> &'static str {
        match self {
            ReturnType::Boolean => "boolean",
            ReturnType::Number => "number",
            ReturnType::Object => "object",
            ReturnType::String => "string",
            ReturnType::Array => "array",
        }
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinFunction {
    pub name: &'static str,
    /// `"name: type"` strings, in call order.
    pub parameters: &'static [&'static str],
    pub return_type: ReturnType,
    pub description: &'static str,
}

impl BuiltinFunction {
    /// Parameter names without their type annotations.
    pub fn param_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.parameters
            .iter()
            .map(|&param| param.split(':').next().unwrap_or(param).trim())
    }
}

macro_rules! builtin {
    ($name:literal, [$($param:literal),* $(,)?], $ret:ident, $desc:literal) => {
        BuiltinFunction {
            name: $name,
            parameters: &[$($param),*],
            return_type: ReturnType::$ret,
            description: $desc,
        }
    };
}

static BUILTIN_FUNCTIONS: &[BuiltinFunction] = &[
    // string functions
    builtin!("length", ["str: string"], Number,
        "Returns the length of a string."),
    builtin!("concat", ["...strings: string"], String,
        "Combine two or more strings and return the combined string."),
    builtin!("replace", ["text: string", "oldText: string", "newText: string"], String,
        "Replace a substring with the specified string, and return the updated string. Case sensitive."),
    builtin!("replaceIgnoreCase", ["text: string", "oldText: string", "newText: string"], String,
        "Replace a substring with the specified string, and return the updated string. Case in-sensitive."),
    builtin!("split", ["text: string", "delimiter: string"], Array,
        "Returns an array that contains substrings based on the delimiter specified."),
    builtin!("substring", ["text: string", "startIndex: number", "length?: number"], String,
        "Returns characters from a string. Substring(sourceString, startPos, endPos). startPos cannot be less than 0. endPos greater than source strings length will be taken as the max length of the string."),
    builtin!("toLower", ["text: string"], String,
        "Convert a string to all lower case characters."),
    builtin!("toUpper", ["text: string"], String,
        "Convert a string to all upper case characters."),
    builtin!("trim", ["text: string"], String,
        "Remove leading and trailing white spaces from a string."),
    builtin!("addOrdinal", ["num: number"], String,
        "Return the ordinal number of the input number."),
    builtin!("endsWith", ["text: string", "value: string"], Boolean,
        "Check whether a string ends with a specific substring. Return true if the substring is found, or return false if not found. This function is case-insensitive."),
    builtin!("startsWith", ["text: string", "value: string"], Boolean,
        "Check whether a string starts with a specific substring. Return true if the substring is found, or return false if not found. This function is case-insensitive."),
    builtin!("countWord", ["text: string"], Number,
        "Returns the number of words in the input string."),
    builtin!("lastIndexOf", ["text: string", "value: string"], Number,
        "Returns the index of the last occurrence of a specified value in a string or array. If the value is not found, the function returns -1."),
    builtin!("indexOf", ["text: string", "value: string"], Number,
        "Returns the index of the first occurrence of a specified value in a string or array. If the value is not found, the function returns -1."),
    builtin!("newGuid", [], String,
        "Return new guid string."),
    builtin!("eol", [], String,
        "Return the end of line (EOL) sequence text."),
    builtin!("sentenceCase", ["text: string"], String,
        "Capitalize the first letter of the first word in a string, and lowercase the remaining letters."),
    builtin!("titleCase", ["text: string"], String,
        "Capitalize the first letter of each word in a string, and lowercase the remaining letters."),
    builtin!("reverse", ["value: string | array"], Object,
        "Reverse the order of the elements in a string or array."),
    // collection functions
    builtin!("count", ["collection: string | array"], Number,
        "Returns the number of items in the collection."),
    builtin!("contains", ["collection: string | array | map", "value: string | object"], Boolean,
        "Works to find an item in a string or to find an item in an array or to find a parameter in a complex object. E.g. contains('hello world', 'hello'); contains(createArray('1','2'), '1'); contains(json(\"{'foo':'bar'}\"), 'foo')."),
    builtin!("empty", ["collection: any"], Boolean,
        "Check if the collection is empty."),
    builtin!("first", ["collection: string | array"], Object,
        "Returns the first item from the collection."),
    builtin!("join", ["collection: array", "delimiter: string", "lastDelimiter?: string"], String,
        "Return a string that has all the items from an array and has each character separated by a delimiter."),
    builtin!("last", ["collection: string | array"], Object,
        "Returns the last item from the collection."),
    builtin!("foreach", ["collection: array | object", "iteratorName: string", "function: any"], Array,
        "Operate on each element and return the new collection."),
    builtin!("select", ["collection: array | object", "iteratorName: string", "function: any"], Array,
        "Operate on each element and return the new collection of transformed elements."),
    builtin!("where", ["collection: array | object", "iteratorName: string", "condition: boolean"], Array,
        "Filter on each element and return the new collection of filtered elements which match a specific condition."),
    builtin!("union", ["...collections: array"], Array,
        "Return a collection that has all the items from the specified collections."),
    builtin!("intersection", ["...collections: array"], Array,
        "Return a collection that has only the common items across the specified collections."),
    builtin!("skip", ["array: array", "length: number"], Array,
        "Remove items from the front of a collection, and return all the other items."),
    builtin!("take", ["array: array | string", "length: number"], Object,
        "Return items from the front of a collection."),
    builtin!("subArray", ["array: array", "startIndex: number", "endIndex?: number"], Array,
        "Returns a sub-array from specified start and end position. Index values are case-insensitive."),
    builtin!("sortBy", ["array: array", "property?: string"], Array,
        "Sort elements in the collection with ascending order and return the sorted collection."),
    builtin!("sortByDescending", ["array: array", "property?: string"], Array,
        "Sort elements in the collection with descending order and return the sorted collection."),
    builtin!("indicesAndValues", ["collection: array | object"], Array,
        "Turned an array or object into an array of objects with index (current index) and value properties."),
    builtin!("flatten", ["collection: array", "depth?: number"], Array,
        "Flatten an array into non-array values. You can optionally set the maximum depth to flatten to."),
    builtin!("unique", ["collection: array"], Array,
        "Remove all duplicates from an array."),
    builtin!("any", ["collection: array | object", "iteratorName: string", "condition: boolean"], Boolean,
        "Determine whether any element of a sequence satisfies a condition."),
    builtin!("all", ["collection: array | object", "iteratorName: string", "condition: boolean"], Boolean,
        "Determine whether all elements of a sequence satisfy a condition."),
    // logical comparison functions
    builtin!("and", ["...expressions: boolean"], Boolean,
        "Logical and. Returns true if all specified expressions evaluate to true."),
    builtin!("equals", ["value1: any", "value2: any"], Boolean,
        "Comparison equal. Returns true if specified values are equal."),
    builtin!("greater", ["value1: number | string", "value2: number | string"], Boolean,
        "Comparison greater than. Returns true if the first value is greater than the second."),
    builtin!("greaterOrEquals", ["value1: number | string", "value2: number | string"], Boolean,
        "Comparison greater than or equal to. greaterOrEquals(exp1, exp2). Returns true if the first value is greater than or equal to the second."),
    builtin!("if", ["condition: boolean", "trueValue: any", "falseValue: any"], Object,
        "if(exp, valueIfTrue, valueIfFalse)."),
    builtin!("less", ["value1: number | string", "value2: number | string"], Boolean,
        "Comparison less than operation. Returns true if the first value is less than the second."),
    builtin!("lessOrEquals", ["value1: number | string", "value2: number | string"], Boolean,
        "Comparison less than or equal operation. Returns true if the first value is less than or equal to the second."),
    builtin!("not", ["expression: boolean"], Boolean,
        "Logical not operator. Returns true if the expression is false."),
    builtin!("or", ["...expressions: boolean"], Boolean,
        "Logical or operation. Returns true if at least one expression is true or all are false."),
    builtin!("exists", ["expression: any"], Boolean,
        "Evaluates an expression for truthiness."),
    // conversion functions
    builtin!("float", ["value: string"], Number,
        "Return floating point representation of the specified string or the string itself if conversion is not possible."),
    builtin!("int", ["value: string"], Number,
        "Return integer representation of the specified string or the string itself if conversion is not possible."),
    builtin!("string", ["value: any", "locale?: string"], String,
        "Return string version of the specified value."),
    builtin!("bool", ["value: any"], Boolean,
        "Return Boolean representation of the specified string. bool('true'), bool(0)."),
    builtin!("createArray", ["...objects: any"], Array,
        "Create an array from multiple inputs."),
    builtin!("array", ["value: string"], Array,
        "Return an array from a single specified input."),
    builtin!("json", ["value: string | xml"], Object,
        "Return the JavaScript Object Notation (JSON) type value or object of a string or XML."),
    builtin!("xml", ["xmlStr: string"], Object,
        "Return the XML version for a string that contains a JSON object."),
    builtin!("base64", ["value: string | byteArray"], String,
        "Return the base64-encoded version of a string or byte array."),
    builtin!("base64ToBinary", ["value: string"], Object,
        "Return the binary version of a base64-encoded string."),
    builtin!("base64ToString", ["value: string"], String,
        "Return the string version of a base64-encoded string."),
    builtin!("binary", ["value: string"], Object,
        "Return the binary version of an input value."),
    builtin!("dataUri", ["value: string"], String,
        "Return the URI for an input value."),
    builtin!("dataUriToBinary", ["value: string"], Object,
        "Return the binary version of a data URI."),
    builtin!("dataUriToString", ["value: string"], String,
        "Return the string version of a data URI."),
    builtin!("uriComponent", ["value: string"], String,
        "Return the binary version of a URI component."),
    builtin!("uriComponentToString", ["value: string"], String,
        "Return the string version of a URI-encoded string."),
    builtin!("formatNumber", ["number: number", "precision: number", "locale?: string"], String,
        "Format number into required decimal numbers."),
    builtin!("jsonStringify", ["value: object"], String,
        "Return the JSON string of a value."),
    builtin!("stringOrValue", ["value: string"], Object,
        "Wrap string interpolation to get the real value. For example, stringOrValue('${1}') returns the number 1, while stringOrValue('${1} item') returns the string \"1 item\"."),
    // math functions
    builtin!("abs", ["number: number"], Number,
        "Returns the absolute value of the specified number."),
    builtin!("add", ["num1: number", "num2: number"], Number,
        "Mathematical addition. Accepts two parameters. Returns the sum of the two values."),
    builtin!("div", ["dividend: number", "divisor: number"], Number,
        "Mathematical division. Returns the quotient of the two numbers."),
    builtin!("max", ["...numbers: number"], Number,
        "Returns the largest value from a collection."),
    builtin!("min", ["...numbers: number"], Number,
        "Returns the smallest value from a collection."),
    builtin!("mod", ["dividend: number", "divisor: number"], Number,
        "Returns remainder from dividing two numbers."),
    builtin!("mul", ["multiplicand1: number", "multiplicand2: number"], Number,
        "Mathematical multiplication. Returns the product of multiplying the two numbers."),
    builtin!("rand", ["minValue: number", "maxValue: number"], Number,
        "Returns a random number between specified min and max value. rand(<minValue>, <maxValue>)."),
    builtin!("sqrt", ["number: number"], Number,
        "Returns the square root of the specified number."),
    builtin!("sub", ["minuend: number", "subtrahend: number"], Number,
        "Mathematical subtraction. Returns the difference of the two numbers."),
    builtin!("sum", ["array: array"], Number,
        "Returns the sum of numbers in an array."),
    builtin!("range", ["startIndex: number", "count: number"], Array,
        "Return an integer array that starts from a specified integer with the given number of items."),
    builtin!("exp", ["base: number", "exponent: number"], Number,
        "Return exponentiation of one number to another."),
    builtin!("average", ["array: array"], Number,
        "Return the average of a numeric array."),
    builtin!("floor", ["number: number"], Number,
        "Return the largest integral value less than or equal to the specified number."),
    builtin!("ceiling", ["number: number"], Number,
        "Return the smallest integral value greater than or equal to the specified number."),
    builtin!("round", ["number: number", "precision?: number"], Number,
        "Round a value to the nearest integer or to the specified number of fractional digits."),
    // date and time functions
    builtin!("addDays", ["timestamp: string", "days: number", "format?: string"], String,
        "Add number of specified days to a given timestamp."),
    builtin!("addHours", ["timestamp: string", "hours: number", "format?: string"], String,
        "Add specified number of hours to a given timestamp."),
    builtin!("addMinutes", ["timestamp: string", "minutes: number", "format?: string"], String,
        "Add specified number of minutes to a given timestamp."),
    builtin!("addSeconds", ["timestamp: string", "seconds: number", "format?: string"], String,
        "Add specified number of seconds to a given timestamp."),
    builtin!("dayOfMonth", ["timestamp: string"], Number,
        "Returns day of month for a given timestamp or timex expression."),
    builtin!("dayOfWeek", ["timestamp: string"], Number,
        "Returns day of the week for a given timestamp."),
    builtin!("dayOfYear", ["timestamp: string"], Number,
        "Returns day of the year for a given timestamp."),
    builtin!("formatDateTime", ["timestamp: string", "format?: string", "locale?: string"], String,
        "Return a timestamp in the specified format."),
    builtin!("formatEpoch", ["epoch: number", "format?: string", "locale?: string"], String,
        "Return a timestamp in the specified format from UNIX time (also know as Epoch time, POSIX time, UNIX Epoch time)."),
    builtin!("formatTicks", ["ticks: number", "format?: string", "locale?: string"], String,
        "Return a timestamp in the specified format from ticks."),
    builtin!("subtractFromTime", ["timestamp: string", "interval: number", "timeUnit: string", "format?: string"], String,
        "Subtract a number of time units from a timestamp."),
    builtin!("utcNow", ["format?: string"], String,
        "Returns current timestamp as string."),
    builtin!("dateReadBack", ["currentDate: string", "targetDate: string"], String,
        "Uses the date-time library to provide a date readback. dateReadBack(currentDate, targetDate). E.g. dateReadBack('2016/05/30,'2016/05/23')=>\"Yesterday\"."),
    builtin!("month", ["timestamp: string"], Number,
        "Returns the month of given timestamp."),
    builtin!("date", ["timestamp: string"], String,
        "Returns date for a given timestamp."),
    builtin!("year", ["timestamp: string"], Number,
        "Returns year for the given timestamp."),
    builtin!("getTimeOfDay", ["timestamp: string"], String,
        "Returns time of day for a given timestamp (midnight = 12AM, morning = 12:01AM – 11:59PM, noon = 12PM, afternoon = 12:01PM -05:59PM, evening = 06:00PM – 10:00PM, night = 10:01PM – 11:59PM)."),
    builtin!("getFutureTime", ["interval: number", "timeUnit: string", "format?: string"], String,
        "Returns current timestamp plus specified time units."),
    builtin!("getPastTime", ["interval: number", "timeUnit: string", "format?: string"], String,
        "Returns current timestamp minus specified time units."),
    builtin!("addToTime", ["timestamp: string", "interval: number", "timeUnit: string", "format?: string"], String,
        "Add x number of time units to a timestamp."),
    builtin!("convertFromUTC", ["timestamp: string", "destinationTimeZone: string", "format?: string"], String,
        "Convert a timestamp from Universal Time Coordinated (UTC) to the target time zone."),
    builtin!("convertToUTC", ["timestamp: string", "sourceTimeZone: string", "format?: string"], String,
        "Convert a timestamp to Universal Time Coordinated (UTC) from the source time zone."),
    builtin!("startOfDay", ["timestamp: string", "format?: string"], String,
        "Return the start of the day for a timestamp."),
    builtin!("startOfHour", ["timestamp: string", "format?: string"], String,
        "Return the start of the hour for a timestamp."),
    builtin!("startOfMonth", ["timestamp: string", "format?: string"], String,
        "Return the start of the month for a timestamp."),
    builtin!("ticks", ["timestamp: string"], Number,
        "Return the ticks property value of a specified timestamp."),
    builtin!("ticksToDays", ["ticks: number"], Number,
        "Convert a ticks property value to the number of days."),
    builtin!("ticksToHours", ["ticks: number"], Number,
        "Convert a ticks property value to the number of hours."),
    builtin!("ticksToMinutes", ["ticks: number"], Number,
        "Convert a ticks property value to the number of minutes."),
    builtin!("dateTimeDiff", ["timestamp1: string", "timestamp2: string"], Number,
        "Return the difference in ticks between two timestamps."),
    builtin!("getNextViableDate", ["timex: string", "timezone?: string"], String,
        "Return the next viable date of a timex expression based on the current date and an optionally specified timezone."),
    builtin!("getPreviousViableDate", ["timex: string", "timezone?: string"], String,
        "Return the previous viable date of a timex expression based on the current date and an optionally specified timezone."),
    builtin!("getNextViableTime", ["timex: string", "timezone?: string"], String,
        "Return the next viable time of a timex expression based on the current time and an optionally specified timezone."),
    builtin!("getPreviousViableTime", ["timex: string", "timezone?: string"], String,
        "Return the previous viable time of a timex expression based on the current time and an optionally specified timezone."),
    builtin!("isDefinite", ["timex: string | object"], Boolean,
        "Return true if the TimexProperty or timex expression refers to a valid date. Valid dates contain the month, dayOfMonth and year."),
    builtin!("isTime", ["timex: string | object"], Boolean,
        "Return true if the TimexProperty or timex expression refers to a valid time. Valid time contains hours, minutes and seconds."),
    builtin!("isDuration", ["timex: string | object"], Boolean,
        "Return true if the TimexProperty or timex expression refers to a valid duration."),
    builtin!("isDate", ["timex: string | object"], Boolean,
        "Return true if the TimexProperty or timex expression refers to a valid date. Valid dates contain the month and dayOfMonth, or contain the dayOfWeek."),
    builtin!("isTimeRange", ["timex: string | object"], Boolean,
        "Return true if the TimexProperty or timex expression refers to a valid time range. Valid time ranges contain partOfDay."),
    builtin!("isDateRange", ["timex: string | object"], Boolean,
        "Return true if the TimexProperty or timex expression refers to a valid date range."),
    builtin!("isPresent", ["timex: string | object"], Boolean,
        "Return true if the TimexProperty or timex expression refers to the present."),
    // url parsing functions
    builtin!("uriHost", ["uri: string"], String,
        "Returns the host value of a unified resource identifier (URI)."),
    builtin!("uriPath", ["uri: string"], String,
        "Returns the path value of a unified resource identifier (URI)."),
    builtin!("uriPathAndQuery", ["uri: string"], String,
        "Returns the path and query values of a unified resource identifier (URI)."),
    builtin!("uriPort", ["uri: string"], Number,
        "Returns the port value of a unified resource identifier (URI)."),
    builtin!("uriQuery", ["uri: string"], String,
        "Returns the query value of a unified resource identifier (URI)."),
    builtin!("uriScheme", ["uri: string"], String,
        "Returns the scheme value of a unified resource identifier (URI)."),
    // object manipulation and construction functions
    builtin!("addProperty", ["object: object", "property: string", "value: any"], Object,
        "Add a property and its value, or name-value pair, to a JSON object, and return the updated object. If the object already exists at runtime the function throws an error."),
    builtin!("removeProperty", ["object: object", "property: string"], Object,
        "Remove a property from an object and return the updated object."),
    builtin!("setProperty", ["object: object", "property: string", "value: any"], Object,
        "Set the value for an object's property and return the updated object. To add a new property, you can use this function or the addProperty() function."),
    builtin!("getProperty", ["object: object", "property: string"], Object,
        "Return the value of the given property in a JSON object."),
    builtin!("setPathToValue", ["path: any", "value: any"], Object,
        "Set the value of a specific path and return the value."),
    builtin!("coalesce", ["...objects: any"], Object,
        "Return the first non-null value from one or more parameters. Empty strings, empty arrays, and empty objects are not null."),
    builtin!("xPath", ["xml: any", "xpath: any"], Object,
        "Check XML for nodes or values that match an XPath(XML Path Language) expression, and return the matching nodes or values. An XPath expression (referred to as XPath) helps you navigate an XML document structure so that you can select nodes or compute values in the XML content."),
    builtin!("jPath", ["json: any", "path: string"], Object,
        "Check JSON or JSON string for nodes or value that match a path expression, and return the matching nodes."),
    builtin!("merge", ["...objects: object"], Object,
        "Merge multiple JSON objects together into a single object."),
    // regular expression functions
    builtin!("isMatch", ["target: string", "pattern: string"], Boolean,
        "test a given string ia match a common regex pattern."),
    // type checking functions
    builtin!("isInteger", ["value: any"], Boolean,
        "Return true if the given input is an integer number."),
    builtin!("isFloat", ["value: any"], Boolean,
        "Return true if the given input is a float point number."),
    builtin!("isBoolean", ["value: any"], Boolean,
        "Return true if the given input is a Boolean."),
    builtin!("isArray", ["value: any"], Boolean,
        "Return true if the given input is an array."),
    builtin!("isObject", ["value: any"], Boolean,
        "Return true if the given input is a complex object or false if it is a primitive object."),
    builtin!("isDateTime", ["value: any"], Boolean,
        "Return true if the given input is a UTC ISO format timestamp."),
    builtin!("isString", ["value: any"], Boolean,
        "Return true if the given input is a string."),
    // template functions
    builtin!("fromFile", ["filePath: string", "evaluate?: boolean"], String,
        "Load the content of the specified file and, optionally, evaluate it as a template body."),
    builtin!("ActivityAttachment", ["content: object", "type: string"], Object,
        "Return an activityAttachment constructed from an object and a type."),
    builtin!("evaluate", ["templateBody: string"], String,
        "Evaluate an inline string as a template body and return the result."),
    builtin!("template", ["templateName: string", "...params: any"], Object,
        "Return the evaluated result of the template with the given name and parameters."),
    builtin!("expandText", ["text: string"], Object,
        "Expand the string interpolations in the given text and return the result."),
    builtin!("isTemplate", ["templateName: string"], Boolean,
        "Return true if a template with the given name exists in the current LG file."),
];

static BY_NAME: Lazy<HashMap<&'static str, &'static BuiltinFunction>> = Lazy::new(|| {
    BUILTIN_FUNCTIONS
        .iter()
        .map(|function| (function.name, function))
        .collect()
});

/// All builtin functions in declaration order.
pub fn all() -> &'static [BuiltinFunction] {
    BUILTIN_FUNCTIONS
}

pub fn lookup(name: &str) -> Option<&'static BuiltinFunction> {
    BY_NAME.get(name).copied()
}

/// Qualifier that may precede a builtin name inside an expression.
pub const BUILTIN_PREFIX: &str = "builtin.";

/// Drops a single leading `builtin.` qualifier, if present.
pub fn strip_prefix(name: &str) -> &str {
    name.strip_prefix(BUILTIN_PREFIX).unwrap_or(name)
}
