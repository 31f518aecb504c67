//! Diagnostic message table.
//!
//! Codes are grouped by hundreds: 2000s for relation and instantiation
//! failures, 2100s for call resolution and name lookup, 7000s for warnings.

use super::{DiagnosticCategory, DiagnosticMessage};

pub mod diagnostic_codes {
    pub const TYPE_NOT_ASSIGNABLE_TO_TYPE: u32 = 2001;
    pub const RETURN_TYPE_MISMATCH: u32 = 2002;
    pub const ARGUMENT_NOT_ASSIGNABLE_TO_PARAMETER: u32 = 2003;
    pub const CAST_UNREACHABLE: u32 = 2004;
    pub const TYPE_PARAMETER_CONSTRAINT_NOT_SATISFIED: u32 = 2005;
    pub const TYPE_IS_NOT_GENERIC: u32 = 2006;
    pub const WRONG_TYPE_ARGUMENT_COUNT: u32 = 2007;
    pub const TYPE_INSTANTIATION_EXCESSIVELY_DEEP: u32 = 2008;
    pub const EXPECTED_ARGUMENTS: u32 = 2101;
    pub const NO_MATCHING_SIGNATURE: u32 = 2102;
    pub const AMBIGUOUS_CALL: u32 = 2103;
    pub const TYPE_HAS_NO_CALL_SIGNATURES: u32 = 2104;
    pub const CANNOT_FIND_NAME: u32 = 2105;
    pub const PROPERTY_DOES_NOT_EXIST_ON_TYPE: u32 = 2106;
    pub const OPERATOR_CANNOT_BE_APPLIED: u32 = 2107;
    pub const VALUE_IS_POSSIBLY_NULLISH: u32 = 2108;
    pub const LAMBDA_PARAMETER_COUNT_MISMATCH: u32 = 2109;
    pub const LAMBDA_PARAMETER_NEEDS_TYPE: u32 = 2110;
    pub const VARIABLE_NEEDS_TYPE: u32 = 2111;
    pub const MEMBER_IS_NOT_ACCESSIBLE: u32 = 2112;
    pub const UNREACHABLE_CODE: u32 = 7001;
    pub const INSTANCEOF_ALWAYS_TRUE: u32 = 7002;
}

pub mod diagnostic_messages {
    pub const TYPE_NOT_ASSIGNABLE: &str = "Type '{0}' is not assignable to type '{1}'.";
    pub const RETURN_TYPE_MISMATCH: &str =
        "Type '{0}' is not compatible with the enclosing function's return type '{1}'.";
    pub const ARGUMENT_NOT_ASSIGNABLE: &str =
        "Argument of type '{0}' is not assignable to parameter of type '{1}'.";
    pub const CAST_UNREACHABLE: &str = "Cast from type '{0}' to type '{1}' is unreachable.";
    pub const TYPE_NOT_SATISFY_CONSTRAINT: &str =
        "Type argument '{0}' does not satisfy the constraint '{1}' of type parameter '{2}'.";
    pub const TYPE_IS_NOT_GENERIC: &str = "Type '{0}' is not generic.";
    pub const WRONG_TYPE_ARGUMENT_COUNT: &str =
        "'{0}' expects {1} type argument(s), but {2} were provided.";
    pub const TYPE_INSTANTIATION_EXCESSIVELY_DEEP: &str =
        "Type instantiation is excessively deep and possibly infinite.";
    pub const EXPECTED_ARGUMENTS: &str = "Expected {0} arguments, but got {1}.";
    pub const NO_MATCHING_SIGNATURE: &str =
        "No matching call signature for {0}({1}). Candidates: {2}";
    pub const AMBIGUOUS_CALL: &str = "Call to '{0}' is ambiguous. Candidates: {1}";
    pub const TYPE_HAS_NO_CALL_SIGNATURES: &str = "Type '{0}' has no call signatures.";
    pub const CANNOT_FIND_NAME: &str = "Cannot find name '{0}'.";
    pub const PROPERTY_DOES_NOT_EXIST: &str = "Property '{0}' does not exist on type '{1}'.";
    pub const OPERATOR_CANNOT_BE_APPLIED: &str =
        "Operator '{0}' cannot be applied to types '{1}' and '{2}'.";
    pub const VALUE_IS_POSSIBLY_NULLISH: &str = "Value of type '{0}' is possibly nullish.";
    pub const LAMBDA_PARAMETER_COUNT_MISMATCH: &str =
        "Lambda with {0} parameter(s) is not assignable to parameter of type '{1}'.";
    pub const LAMBDA_PARAMETER_NEEDS_TYPE: &str =
        "Parameter '{0}' needs a type annotation when the lambda is not a call argument.";
    pub const VARIABLE_NEEDS_TYPE: &str =
        "Variable '{0}' needs a type annotation or an initializer.";
    pub const MEMBER_IS_NOT_ACCESSIBLE: &str =
        "Method '{0}' is {1} and not accessible on type '{2}' from here.";
    pub const UNREACHABLE_CODE: &str = "Unreachable code detected.";
    pub const INSTANCEOF_ALWAYS_TRUE: &str =
        "'instanceof' test is always true: '{0}' is already a subtype of '{1}'.";
}

use self::diagnostic_codes as c;
use self::diagnostic_messages as m;

const fn error(code: u32, message: &'static str) -> DiagnosticMessage {
    DiagnosticMessage {
        code,
        category: DiagnosticCategory::Error,
        message,
    }
}

const fn warning(code: u32, message: &'static str) -> DiagnosticMessage {
    DiagnosticMessage {
        code,
        category: DiagnosticCategory::Warning,
        message,
    }
}

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    error(c::TYPE_NOT_ASSIGNABLE_TO_TYPE, m::TYPE_NOT_ASSIGNABLE),
    error(c::RETURN_TYPE_MISMATCH, m::RETURN_TYPE_MISMATCH),
    error(c::ARGUMENT_NOT_ASSIGNABLE_TO_PARAMETER, m::ARGUMENT_NOT_ASSIGNABLE),
    error(c::CAST_UNREACHABLE, m::CAST_UNREACHABLE),
    error(
        c::TYPE_PARAMETER_CONSTRAINT_NOT_SATISFIED,
        m::TYPE_NOT_SATISFY_CONSTRAINT,
    ),
    error(c::TYPE_IS_NOT_GENERIC, m::TYPE_IS_NOT_GENERIC),
    error(c::WRONG_TYPE_ARGUMENT_COUNT, m::WRONG_TYPE_ARGUMENT_COUNT),
    error(
        c::TYPE_INSTANTIATION_EXCESSIVELY_DEEP,
        m::TYPE_INSTANTIATION_EXCESSIVELY_DEEP,
    ),
    error(c::EXPECTED_ARGUMENTS, m::EXPECTED_ARGUMENTS),
    error(c::NO_MATCHING_SIGNATURE, m::NO_MATCHING_SIGNATURE),
    error(c::AMBIGUOUS_CALL, m::AMBIGUOUS_CALL),
    error(c::TYPE_HAS_NO_CALL_SIGNATURES, m::TYPE_HAS_NO_CALL_SIGNATURES),
    error(c::CANNOT_FIND_NAME, m::CANNOT_FIND_NAME),
    error(c::PROPERTY_DOES_NOT_EXIST_ON_TYPE, m::PROPERTY_DOES_NOT_EXIST),
    error(c::OPERATOR_CANNOT_BE_APPLIED, m::OPERATOR_CANNOT_BE_APPLIED),
    error(c::VALUE_IS_POSSIBLY_NULLISH, m::VALUE_IS_POSSIBLY_NULLISH),
    error(
        c::LAMBDA_PARAMETER_COUNT_MISMATCH,
        m::LAMBDA_PARAMETER_COUNT_MISMATCH,
    ),
    error(c::LAMBDA_PARAMETER_NEEDS_TYPE, m::LAMBDA_PARAMETER_NEEDS_TYPE),
    error(c::VARIABLE_NEEDS_TYPE, m::VARIABLE_NEEDS_TYPE),
    error(c::MEMBER_IS_NOT_ACCESSIBLE, m::MEMBER_IS_NOT_ACCESSIBLE),
    warning(c::UNREACHABLE_CODE, m::UNREACHABLE_CODE),
    warning(c::INSTANCEOF_ALWAYS_TRUE, m::INSTANCEOF_ALWAYS_TRUE),
];
