//! §6 command dispatch: decode an inbound BiDi command by method name,
//! route it to the processor, and encode the result back into the wire
//! envelope. Grounded on the teacher's `CommandMessage` handling in
//! `handler/mod.rs`, which performs the analogous decode-route-encode step
//! for outbound CDP commands — here it runs in the opposite direction.

use crate::bidi::{self, browsing_context, network, script, session, OutgoingMessage};
use crate::domain::ids::BrowsingContextId;
use crate::error::BidiError;
use crate::processor::BrowsingContextProcessor;

/// Decodes `command.params` against the shape named by `command.method`
/// and applies it to the processor, returning the `result` payload on
/// success. Unknown methods are a client error (`unknown command`), not a
/// panic (§7).
pub async fn dispatch(processor: &mut BrowsingContextProcessor, command: &bidi::IncomingCommand) -> OutgoingMessage {
    match handle(processor, command).await {
        Ok(result) => OutgoingMessage::success(command.id, result),
        Err(err) => OutgoingMessage::error(Some(command.id), &err),
    }
}

async fn handle(processor: &mut BrowsingContextProcessor, command: &bidi::IncomingCommand) -> Result<serde_json::Value, BidiError> {
    match command.method.as_str() {
        "session.subscribe" => {
            let params: session::SubscribeParams = parse(&command.params)?;
            let id = processor.subscribe(params.events, params.contexts);
            Ok(serde_json::json!({ "subscription": id.0 }))
        }
        "session.unsubscribe" => {
            let params: session::UnsubscribeParams = parse(&command.params)?;
            processor.unsubscribe(&params.subscriptions);
            Ok(serde_json::Value::Object(Default::default()))
        }
        "network.addIntercept" => {
            let params: network::AddInterceptParams = parse(&command.params)?;
            let id = processor.add_intercept(params.url_patterns, params.phases, params.contexts);
            Ok(serde_json::json!({ "intercept": id.0 }))
        }
        "network.removeIntercept" => {
            let params: network::RemoveInterceptParams = parse(&command.params)?;
            processor.remove_intercept(&params.intercept)?;
            Ok(serde_json::Value::Object(Default::default()))
        }
        "network.continueRequest" => {
            let params: network::ContinueRequestParams = parse(&command.params)?;
            processor.requests.resume_before_request_sent(&params.request);
            Ok(serde_json::Value::Object(Default::default()))
        }
        "network.continueResponse" => {
            let params: network::ContinueResponseParams = parse(&command.params)?;
            processor.requests.resume_response_started(&params.request);
            Ok(serde_json::Value::Object(Default::default()))
        }
        "network.continueWithAuth" => {
            let params: network::ContinueWithAuthParams = parse(&command.params)?;
            let request = match &params {
                network::ContinueWithAuthParams::Default { request }
                | network::ContinueWithAuthParams::Cancel { request }
                | network::ContinueWithAuthParams::ProvideCredentials { request, .. } => request,
            };
            processor.requests.resume_auth_required(request);
            Ok(serde_json::Value::Object(Default::default()))
        }
        "script.addPreloadScript" => {
            let params: script::AddPreloadScriptParams = parse(&command.params)?;
            let context_filter = params.contexts.and_then(|mut c| if c.is_empty() { None } else { Some(c.remove(0)) });
            let id = processor.add_preload_script(params.function_declaration, params.sandbox, context_filter);
            Ok(serde_json::json!({ "script": id.0 }))
        }
        "script.removePreloadScript" => {
            let params: script::RemovePreloadScriptParams = parse(&command.params)?;
            processor.remove_preload_script(&params.script)?;
            Ok(serde_json::Value::Object(Default::default()))
        }
        "browsingContext.setViewport" => {
            let params: browsing_context::SetViewportParams = parse(&command.params)?;
            processor.set_viewport(&params.context)?;
            Ok(serde_json::Value::Object(Default::default()))
        }
        "browsingContext.close" => {
            let params: browsing_context::CloseParams = parse(&command.params)?;
            processor.close_browsing_context(&params.context).await?;
            Ok(serde_json::Value::Object(Default::default()))
        }
        "browsingContext.navigate" => {
            let params: browsing_context::NavigateParams = parse(&command.params)?;
            processor.navigate_browsing_context(&params.context, params.url).await?;
            Ok(serde_json::Value::Object(Default::default()))
        }
        other => Err(BidiError::new(
            crate::error::ErrorCode::UnknownCommand,
            format!("Unknown command: {other}"),
        )),
    }
}

fn parse<T: serde::de::DeserializeOwned>(value: &serde_json::Value) -> Result<T, BidiError> {
    serde_json::from_value(value.clone())
        .map_err(|err| BidiError::invalid_argument(format!("invalid params: {err}")))
}

/// `browsingContext.create` does not go through [`dispatch`]: its BiDi reply
/// is only sent once the new target's `attachedToTarget` has landed the
/// context in storage, and that event is only ever observed by whatever
/// drives the CDP event stream. [`crate::mapper::Mapper`] calls this
/// directly, sends `Target.createTarget`, and holds the command id until the
/// matching attach event arrives instead of awaiting it here.
pub async fn begin_create_browsing_context(
    processor: &mut BrowsingContextProcessor,
    command: &bidi::IncomingCommand,
) -> Result<BrowsingContextId, BidiError> {
    let params: browsing_context::CreateParams = parse(&command.params)?;
    processor
        .create_browsing_context(params.create_type, params.user_context)
        .await
}
