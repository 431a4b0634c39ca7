//! Invoke functions parsed into a typed command.

use crate::domain::Metadata;
use cc_shim::domain::args::{
    expect_args, expect_args_range, key_value_pairs, optional_arg, parse_f64, parse_json,
    require_non_empty,
};
use cc_shim::ChaincodeError;

pub const MAX_METADATA_PAIRS: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub id: String,
    pub name: String,
    pub description: String,
    pub sku: String,
    pub manufacturer: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewShipment {
    pub id: String,
    pub product_id: String,
    pub from: String,
    pub to: String,
    pub carrier: String,
    pub tracking_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub id: String,
    pub product_id: String,
    pub transaction_type: String,
    pub from: String,
    pub to: String,
    pub status: String,
    pub amount: Option<f64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProvenance {
    pub product_id: String,
    pub action: String,
    pub actor: String,
    pub location: String,
    pub evidence: Metadata,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SupplyChainCommand {
    CreateProduct(NewProduct),
    UpdateProduct {
        id: String,
        status: String,
        metadata: Vec<(String, String)>,
    },
    GetProduct(String),
    ListProducts {
        category: Option<String>,
    },
    CreateShipment(NewShipment),
    UpdateShipmentStatus {
        id: String,
        status: String,
        location: String,
    },
    DeliverShipment {
        id: String,
        recipient: String,
    },
    GetShipment(String),
    TrackShipment(String),
    RecordTransaction(NewTransaction),
    GetTransaction(String),
    GetProductTransactions(String),
    RecordProvenance(NewProvenance),
    VerifyProvenance {
        product_id: String,
        provenance_id: String,
        verifier: String,
    },
    GetProductProvenance(String),
    TraceProduct(String),
}

impl SupplyChainCommand {
    pub fn parse(function: &str, args: &[String]) -> Result<Self, ChaincodeError> {
        use SupplyChainCommand as C;

        let single = || -> Result<String, ChaincodeError> {
            expect_args(function, args, 1)?;
            Ok(args[0].clone())
        };

        Ok(match function {
            "createProduct" => {
                expect_args_range(function, args, 5, 6)?;
                require_non_empty("product id", &args[0])?;
                C::CreateProduct(NewProduct {
                    id: args[0].clone(),
                    name: args[1].clone(),
                    description: args[2].clone(),
                    sku: args[3].clone(),
                    manufacturer: args[4].clone(),
                    category: optional_arg(args, 5).map(str::to_string),
                })
            }
            "updateProduct" => {
                expect_args_range(function, args, 2, 2 + 2 * MAX_METADATA_PAIRS)?;
                require_non_empty("status", &args[1])?;
                C::UpdateProduct {
                    id: args[0].clone(),
                    status: args[1].clone(),
                    metadata: key_value_pairs(&args[2..])?,
                }
            }
            "getProduct" => C::GetProduct(single()?),
            "listProducts" => {
                expect_args_range(function, args, 0, 1)?;
                C::ListProducts {
                    category: optional_arg(args, 0).map(str::to_string),
                }
            }
            "createShipment" => {
                expect_args(function, args, 6)?;
                require_non_empty("shipment id", &args[0])?;
                require_non_empty("tracking id", &args[5])?;
                C::CreateShipment(NewShipment {
                    id: args[0].clone(),
                    product_id: args[1].clone(),
                    from: args[2].clone(),
                    to: args[3].clone(),
                    carrier: args[4].clone(),
                    tracking_id: args[5].clone(),
                })
            }
            "updateShipmentStatus" => {
                expect_args(function, args, 3)?;
                require_non_empty("status", &args[1])?;
                C::UpdateShipmentStatus {
                    id: args[0].clone(),
                    status: args[1].clone(),
                    location: args[2].clone(),
                }
            }
            "deliverShipment" => {
                expect_args(function, args, 2)?;
                C::DeliverShipment {
                    id: args[0].clone(),
                    recipient: args[1].clone(),
                }
            }
            "getShipment" => C::GetShipment(single()?),
            "trackShipment" => C::TrackShipment(single()?),
            "recordTransaction" => {
                expect_args_range(function, args, 6, 8)?;
                require_non_empty("transaction id", &args[0])?;
                let amount = optional_arg(args, 6)
                    .map(|a| parse_f64("amount", a))
                    .transpose()?;
                C::RecordTransaction(NewTransaction {
                    id: args[0].clone(),
                    product_id: args[1].clone(),
                    transaction_type: args[2].clone(),
                    from: args[3].clone(),
                    to: args[4].clone(),
                    status: args[5].clone(),
                    amount,
                    currency: optional_arg(args, 7).map(str::to_string),
                })
            }
            "getTransaction" => C::GetTransaction(single()?),
            "getProductTransactions" => C::GetProductTransactions(single()?),
            "recordProvenance" => {
                expect_args(function, args, 5)?;
                require_non_empty("action", &args[1])?;
                C::RecordProvenance(NewProvenance {
                    product_id: args[0].clone(),
                    action: args[1].clone(),
                    actor: args[2].clone(),
                    location: args[3].clone(),
                    evidence: parse_json("evidence", &args[4])?,
                })
            }
            "verifyProvenance" => {
                expect_args(function, args, 3)?;
                C::VerifyProvenance {
                    product_id: args[0].clone(),
                    provenance_id: args[1].clone(),
                    verifier: args[2].clone(),
                }
            }
            "getProductProvenance" => C::GetProductProvenance(single()?),
            "traceProduct" => C::TraceProduct(single()?),
            other => {
                return Err(ChaincodeError::validation(format!(
                    "Unknown function: {other}"
                )))
            }
        })
    }
}
