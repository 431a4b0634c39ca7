//! Invoke functions parsed into a typed command.

use crate::domain::{GatewayStatus, Rule};
use cc_shim::domain::args::{
    expect_args, expect_args_range, key_value_pairs, optional_arg, parse_bool, parse_json,
    require_non_empty,
};
use cc_shim::ChaincodeError;

/// Most metadata pairs one `updateGateway` call may carry.
pub const MAX_METADATA_PAIRS: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCommand {
    RegisterGateway {
        id: String,
        public_key: String,
        organization_id: String,
    },
    UpdateGateway {
        id: String,
        metadata: Vec<(String, String)>,
    },
    GetGateway {
        id: String,
    },
    ListGateways {
        status: Option<GatewayStatus>,
    },
    DeactivateGateway {
        id: String,
    },
    Heartbeat {
        id: String,
    },
    CreatePolicy {
        id: String,
        name: String,
        description: String,
        rules: Vec<Rule>,
    },
    UpdatePolicy {
        id: String,
        rules: Vec<Rule>,
    },
    GetPolicy {
        id: String,
    },
    ListPolicies,
    AuditLog {
        gateway_id: String,
        action: String,
        resource: String,
        success: bool,
        error_message: Option<String>,
    },
    QueryAuditLogs {
        gateway_id: Option<String>,
        action: Option<String>,
    },
}

impl GatewayCommand {
    pub fn parse(function: &str, args: &[String]) -> Result<Self, ChaincodeError> {
        let command = match function {
            "registerGateway" => {
                expect_args(function, args, 3)?;
                require_non_empty("gateway id", &args[0])?;
                GatewayCommand::RegisterGateway {
                    id: args[0].clone(),
                    public_key: args[1].clone(),
                    organization_id: args[2].clone(),
                }
            }
            "updateGateway" => {
                expect_args_range(function, args, 3, 1 + 2 * MAX_METADATA_PAIRS)?;
                GatewayCommand::UpdateGateway {
                    id: args[0].clone(),
                    metadata: key_value_pairs(&args[1..])?,
                }
            }
            "getGateway" => {
                expect_args(function, args, 1)?;
                GatewayCommand::GetGateway {
                    id: args[0].clone(),
                }
            }
            "listGateways" => {
                expect_args_range(function, args, 0, 1)?;
                let status = optional_arg(args, 0)
                    .map(|s| s.parse::<GatewayStatus>())
                    .transpose()
                    .map_err(ChaincodeError::Validation)?;
                GatewayCommand::ListGateways { status }
            }
            "deactivateGateway" => {
                expect_args(function, args, 1)?;
                GatewayCommand::DeactivateGateway {
                    id: args[0].clone(),
                }
            }
            "heartbeat" => {
                expect_args(function, args, 1)?;
                GatewayCommand::Heartbeat {
                    id: args[0].clone(),
                }
            }
            "createPolicy" => {
                expect_args(function, args, 4)?;
                require_non_empty("policy id", &args[0])?;
                GatewayCommand::CreatePolicy {
                    id: args[0].clone(),
                    name: args[1].clone(),
                    description: args[2].clone(),
                    rules: parse_json("rules", &args[3])?,
                }
            }
            "updatePolicy" => {
                expect_args(function, args, 2)?;
                GatewayCommand::UpdatePolicy {
                    id: args[0].clone(),
                    rules: parse_json("rules", &args[1])?,
                }
            }
            "getPolicy" => {
                expect_args(function, args, 1)?;
                GatewayCommand::GetPolicy {
                    id: args[0].clone(),
                }
            }
            "listPolicies" => {
                expect_args(function, args, 0)?;
                GatewayCommand::ListPolicies
            }
            "auditLog" => {
                expect_args_range(function, args, 4, 5)?;
                require_non_empty("action", &args[1])?;
                GatewayCommand::AuditLog {
                    gateway_id: args[0].clone(),
                    action: args[1].clone(),
                    resource: args[2].clone(),
                    success: parse_bool("success", &args[3])?,
                    error_message: optional_arg(args, 4).map(str::to_string),
                }
            }
            "queryAuditLogs" => {
                expect_args_range(function, args, 0, 2)?;
                GatewayCommand::QueryAuditLogs {
                    gateway_id: optional_arg(args, 0).map(str::to_string),
                    action: optional_arg(args, 1).map(str::to_string),
                }
            }
            other => {
                return Err(ChaincodeError::validation(format!(
                    "Unknown function: {other}"
                )))
            }
        };
        Ok(command)
    }
}
